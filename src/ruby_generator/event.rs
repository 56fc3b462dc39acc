use super::{EmitterRegistry, Order, RubyGenerator};
use crate::blocks::Block;
use crate::error::EmitError;

pub(super) fn install(registry: &mut EmitterRegistry) {
    registry.register("event_whenflagclicked", event_whenflagclicked);
}

fn event_whenflagclicked(gen: &RubyGenerator<'_>, block: &Block) -> Result<(String, Order), EmitError> {
    let body = gen.next_to_code(block)?;
    Ok((
        format!("self.when(:flag_clicked) do\n{}end\n", body),
        Order::NONE,
    ))
}
