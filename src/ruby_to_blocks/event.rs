use super::{Arg, ConverterRegistry, RubyToBlocksConverter, SendCall};
use crate::blocks::{BlockId, Shape};
use crate::error::ConversionError;

pub(super) fn install(registry: &mut ConverterRegistry) {
    registry.register("event", on_send);
}

fn on_send(
    conv: &mut RubyToBlocksConverter<'_>,
    call: &SendCall<'_>,
) -> Result<Option<BlockId>, ConversionError> {
    if call.name != "when" || !call.receiver.is_self_or_implicit() {
        return Ok(None);
    }
    let (Some(body), [Arg::Sym(event)]) = (call.body, call.args.as_slice()) else {
        return Ok(None);
    };
    let opcode = match event.as_str() {
        "flag_clicked" => "event_whenflagclicked",
        _ => return Ok(None),
    };
    let hat = conv.create_block(opcode, Shape::Hat)?;
    if let Some(first) = conv.convert_body(body)? {
        conv.set_next(&hat, Some(first))?;
    }
    Ok(Some(hat))
}
