use super::{quote_string, EmitterRegistry, Order, RubyGenerator};
use crate::blocks::Block;
use crate::error::EmitError;

pub(super) fn install(registry: &mut EmitterRegistry) {
    registry.register("boost_menu_MOTOR_ID", boost_menu_motor_id);
    registry.register("boost_motorOnFor", boost_motor_on_for);
    registry.register("boost_motorOnForRotation", boost_motor_on_for_rotation);
    registry.register("boost_motorOn", boost_motor_on);
    registry.register("boost_motorOff", boost_motor_off);
    registry.register("boost_setMotorPower", boost_set_motor_power);
}

fn boost_menu_motor_id(_gen: &RubyGenerator<'_>, block: &Block) -> Result<(String, Order), EmitError> {
    let motor = block.field("MOTOR_ID").unwrap_or("A");
    Ok((quote_string(motor), Order::ATOMIC))
}

fn motor_id(gen: &RubyGenerator<'_>, block: &Block) -> Result<String, EmitError> {
    gen.value_or(block, "MOTOR_ID", Order::NONE, "\"A\"")
}

fn boost_motor_on_for(gen: &RubyGenerator<'_>, block: &Block) -> Result<(String, Order), EmitError> {
    let motor = motor_id(gen, block)?;
    let secs = gen.value_or(block, "DURATION", Order::NONE, "0")?;
    Ok((
        format!("boost_motor_turn_on_for({}, {})\n", motor, secs),
        Order::NONE,
    ))
}

fn boost_motor_on_for_rotation(gen: &RubyGenerator<'_>, block: &Block) -> Result<(String, Order), EmitError> {
    let motor = motor_id(gen, block)?;
    let rotation = gen.value_or(block, "ROTATION", Order::NONE, "0")?;
    Ok((
        format!("boost_motor_turn_on_for_rotation({}, {})\n", motor, rotation),
        Order::NONE,
    ))
}

fn boost_motor_on(gen: &RubyGenerator<'_>, block: &Block) -> Result<(String, Order), EmitError> {
    let motor = motor_id(gen, block)?;
    Ok((format!("boost_motor_turn_on({})\n", motor), Order::NONE))
}

fn boost_motor_off(gen: &RubyGenerator<'_>, block: &Block) -> Result<(String, Order), EmitError> {
    let motor = motor_id(gen, block)?;
    Ok((format!("boost_motor_turn_off({})\n", motor), Order::NONE))
}

fn boost_set_motor_power(gen: &RubyGenerator<'_>, block: &Block) -> Result<(String, Order), EmitError> {
    let motor = motor_id(gen, block)?;
    let power = gen.value_or(block, "POWER", Order::NONE, "100")?;
    Ok((
        format!("boost_set_motor_power({}, {})\n", motor, power),
        Order::NONE,
    ))
}
