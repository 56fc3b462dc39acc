use super::{ConverterRegistry, Receiver, RubyToBlocksConverter, SendCall};
use crate::blocks::{BlockId, Shape};
use crate::error::ConversionError;

pub(super) fn install(registry: &mut ConverterRegistry) {
    registry.register("control", on_send);
}

fn on_send(
    conv: &mut RubyToBlocksConverter<'_>,
    call: &SendCall<'_>,
) -> Result<Option<BlockId>, ConversionError> {
    let implicit = call.receiver.is_self_or_implicit();
    let block = match (call.name, call.args.as_slice(), &call.receiver, call.body) {
        ("sleep", [secs], _, None) if implicit && secs.is_number_or_block() => {
            let block = conv.create_block("control_wait", Shape::Statement)?;
            conv.add_number_input(&block, "DURATION", "math_positive_number", secs, 1.0)?;
            block
        }
        ("times", [], Receiver::Value(times), Some(body)) if times.is_number_or_block() => {
            let block = conv.create_block("control_repeat", Shape::Statement)?;
            conv.add_number_input(&block, "TIMES", "math_whole_number", times, 10.0)?;
            conv.add_substack(&block, "SUBSTACK", Some(body))?;
            block
        }
        ("loop", [], _, Some(body)) if implicit => {
            let block = conv.create_block("control_forever", Shape::Statement)?;
            conv.add_substack(&block, "SUBSTACK", Some(body))?;
            block
        }
        _ => return Ok(None),
    };
    Ok(Some(block))
}
