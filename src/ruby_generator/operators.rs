use super::{EmitterRegistry, Order, RubyGenerator};
use crate::blocks::Block;
use crate::error::EmitError;

pub(super) fn install(registry: &mut EmitterRegistry) {
    registry.register("operator_add", operator_add);
    registry.register("operator_subtract", operator_subtract);
    registry.register("operator_multiply", operator_multiply);
    registry.register("operator_divide", operator_divide);
    registry.register("operator_mod", operator_mod);
    registry.register("operator_lt", operator_lt);
    registry.register("operator_gt", operator_gt);
    registry.register("operator_equals", operator_equals);
    registry.register("operator_and", operator_and);
    registry.register("operator_or", operator_or);
    registry.register("operator_not", operator_not);
    registry.register("operator_random", operator_random);
}

fn binary(
    gen: &RubyGenerator<'_>,
    block: &Block,
    op: &str,
    (left, right): (&str, &str),
    order: Order,
    default: &str,
) -> Result<(String, Order), EmitError> {
    let a = gen.value_or(block, left, order, default)?;
    let b = gen.value_or(block, right, order, default)?;
    Ok((format!("{} {} {}", a, op, b), order))
}

const NUMS: (&str, &str) = ("NUM1", "NUM2");
const OPERANDS: (&str, &str) = ("OPERAND1", "OPERAND2");

fn operator_add(gen: &RubyGenerator<'_>, block: &Block) -> Result<(String, Order), EmitError> {
    binary(gen, block, "+", NUMS, Order::ADDITIVE, "0")
}

fn operator_subtract(gen: &RubyGenerator<'_>, block: &Block) -> Result<(String, Order), EmitError> {
    binary(gen, block, "-", NUMS, Order::ADDITIVE, "0")
}

fn operator_multiply(gen: &RubyGenerator<'_>, block: &Block) -> Result<(String, Order), EmitError> {
    binary(gen, block, "*", NUMS, Order::MULTIPLICATIVE, "0")
}

fn operator_divide(gen: &RubyGenerator<'_>, block: &Block) -> Result<(String, Order), EmitError> {
    binary(gen, block, "/", NUMS, Order::MULTIPLICATIVE, "0")
}

fn operator_mod(gen: &RubyGenerator<'_>, block: &Block) -> Result<(String, Order), EmitError> {
    binary(gen, block, "%", NUMS, Order::MULTIPLICATIVE, "0")
}

fn operator_lt(gen: &RubyGenerator<'_>, block: &Block) -> Result<(String, Order), EmitError> {
    binary(gen, block, "<", OPERANDS, Order::RELATIONAL, "0")
}

fn operator_gt(gen: &RubyGenerator<'_>, block: &Block) -> Result<(String, Order), EmitError> {
    binary(gen, block, ">", OPERANDS, Order::RELATIONAL, "0")
}

fn operator_equals(gen: &RubyGenerator<'_>, block: &Block) -> Result<(String, Order), EmitError> {
    binary(gen, block, "==", OPERANDS, Order::RELATIONAL, "\"\"")
}

fn operator_and(gen: &RubyGenerator<'_>, block: &Block) -> Result<(String, Order), EmitError> {
    binary(gen, block, "&&", OPERANDS, Order::LOGICAL_AND, "false")
}

fn operator_or(gen: &RubyGenerator<'_>, block: &Block) -> Result<(String, Order), EmitError> {
    binary(gen, block, "||", OPERANDS, Order::LOGICAL_OR, "false")
}

// `!` binds tighter than any binary operator in Ruby.
fn operator_not(gen: &RubyGenerator<'_>, block: &Block) -> Result<(String, Order), EmitError> {
    let operand = gen.value_or(block, "OPERAND", Order::UNARY_SIGN, "false")?;
    Ok((format!("!{}", operand), Order::UNARY_SIGN))
}

fn operator_random(gen: &RubyGenerator<'_>, block: &Block) -> Result<(String, Order), EmitError> {
    let from = gen.value_or(block, "FROM", Order::ADDITIVE, "0")?;
    let to = gen.value_or(block, "TO", Order::ADDITIVE, "0")?;
    Ok((format!("rand({}..{})", from, to), Order::FUNCTION_CALL))
}
