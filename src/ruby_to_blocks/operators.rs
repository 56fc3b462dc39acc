use super::{Arg, ConverterRegistry, Receiver, RubyToBlocksConverter, SendCall};
use crate::blocks::{BlockId, Shape};
use crate::error::ConversionError;

pub(super) fn install(registry: &mut ConverterRegistry) {
    registry.register("operators", on_send);
}

fn arithmetic_opcode(name: &str) -> Option<&'static str> {
    Some(match name {
        "+" => "operator_add",
        "-" => "operator_subtract",
        "*" => "operator_multiply",
        "/" => "operator_divide",
        "%" => "operator_mod",
        _ => return None,
    })
}

fn comparison_opcode(name: &str) -> Option<&'static str> {
    Some(match name {
        "<" => "operator_lt",
        ">" => "operator_gt",
        "==" => "operator_equals",
        _ => return None,
    })
}

fn on_send(
    conv: &mut RubyToBlocksConverter<'_>,
    call: &SendCall<'_>,
) -> Result<Option<BlockId>, ConversionError> {
    let Receiver::Value(lhs) = &call.receiver else {
        return Ok(None);
    };
    if call.body.is_some() {
        return Ok(None);
    }
    let block = match call.args.as_slice() {
        [rhs] if lhs.is_number_or_block() && rhs.is_number_or_block() => {
            let Some(opcode) = arithmetic_opcode(call.name) else {
                return comparison(conv, call.name, lhs, rhs);
            };
            let block = conv.create_block(opcode, Shape::Value)?;
            conv.add_number_input(&block, "NUM1", "math_number", lhs, 0.0)?;
            conv.add_number_input(&block, "NUM2", "math_number", rhs, 0.0)?;
            block
        }
        [rhs] => return comparison(conv, call.name, lhs, rhs),
        [] if call.name == "!" && lhs.is_block() => {
            let block = conv.create_block("operator_not", Shape::Boolean)?;
            conv.add_boolean_input(&block, "OPERAND", lhs)?;
            block
        }
        _ => return Ok(None),
    };
    Ok(Some(block))
}

fn comparison(
    conv: &mut RubyToBlocksConverter<'_>,
    name: &str,
    lhs: &Arg,
    rhs: &Arg,
) -> Result<Option<BlockId>, ConversionError> {
    let Some(opcode) = comparison_opcode(name) else {
        return Ok(None);
    };
    if !is_operand(lhs) || !is_operand(rhs) {
        return Ok(None);
    }
    let block = conv.create_block(opcode, Shape::Boolean)?;
    operand_input(conv, &block, "OPERAND1", lhs)?;
    operand_input(conv, &block, "OPERAND2", rhs)?;
    Ok(Some(block))
}

fn is_operand(arg: &Arg) -> bool {
    arg.is_number() || arg.is_string_or_block()
}

// Number literals keep a number shadow so they read back as numbers.
fn operand_input(
    conv: &mut RubyToBlocksConverter<'_>,
    block: &str,
    name: &str,
    arg: &Arg,
) -> Result<(), ConversionError> {
    if arg.is_number() {
        conv.add_number_input(block, name, "math_number", arg, 0.0)
    } else {
        conv.add_text_input(block, name, arg, "")
    }
}
