use super::{quote_string, EmitterRegistry, Order, RubyGenerator};
use crate::blocks::Block;
use crate::error::EmitError;

pub(super) fn install(registry: &mut EmitterRegistry) {
    registry.register("text", text);
}

fn text(_gen: &RubyGenerator<'_>, block: &Block) -> Result<(String, Order), EmitError> {
    let value = block.field("TEXT").unwrap_or_default();
    Ok((quote_string(value), Order::ATOMIC))
}
