use super::{Arg, ConverterRegistry, RubyToBlocksConverter, SendCall};
use crate::blocks::{BlockId, Shape};
use crate::error::ConversionError;

pub(super) fn install(registry: &mut ConverterRegistry) {
    registry.register("boost", on_send);
}

fn on_send(
    conv: &mut RubyToBlocksConverter<'_>,
    call: &SendCall<'_>,
) -> Result<Option<BlockId>, ConversionError> {
    if !call.receiver.is_self_or_implicit() || call.body.is_some() {
        return Ok(None);
    }
    let args = call.args.as_slice();
    let block = match (call.name, args) {
        ("boost_motor_turn_on_for", [motor, secs])
            if motor.is_string_or_block() && secs.is_number_or_block() =>
        {
            let block = conv.create_block("boost_motorOnFor", Shape::Statement)?;
            motor_input(conv, &block, motor)?;
            conv.add_number_input(&block, "DURATION", "math_number", secs, 1.0)?;
            block
        }
        ("boost_motor_turn_on_for_rotation", [motor, rotation])
            if motor.is_string_or_block() && rotation.is_number_or_block() =>
        {
            let block = conv.create_block("boost_motorOnForRotation", Shape::Statement)?;
            motor_input(conv, &block, motor)?;
            conv.add_number_input(&block, "ROTATION", "math_number", rotation, 1.0)?;
            block
        }
        ("boost_motor_turn_on", [motor]) if motor.is_string_or_block() => {
            let block = conv.create_block("boost_motorOn", Shape::Statement)?;
            motor_input(conv, &block, motor)?;
            block
        }
        ("boost_motor_turn_off", [motor]) if motor.is_string_or_block() => {
            let block = conv.create_block("boost_motorOff", Shape::Statement)?;
            motor_input(conv, &block, motor)?;
            block
        }
        ("boost_set_motor_power", [motor, power])
            if motor.is_string_or_block() && power.is_number_or_block() =>
        {
            let block = conv.create_block("boost_setMotorPower", Shape::Statement)?;
            motor_input(conv, &block, motor)?;
            conv.add_number_input(&block, "POWER", "math_number", power, 100.0)?;
            block
        }
        _ => return Ok(None),
    };
    Ok(Some(block))
}

fn motor_input(
    conv: &mut RubyToBlocksConverter<'_>,
    block: &str,
    motor: &Arg,
) -> Result<(), ConversionError> {
    let (menu, shadow) = conv.create_field_block("boost_menu_MOTOR_ID", "MOTOR_ID", motor, "A")?;
    conv.add_input(block, "MOTOR_ID", &menu, shadow)
}

#[cfg(test)]
mod tests {
    use crate::ruby_ast::{Node, SendExpression};
    use crate::ruby_to_blocks::RubyToBlocksConverter;

    #[test]
    fn motor_turn_on_for_builds_menu_and_duration() {
        let mut conv = RubyToBlocksConverter::new("Sprite1");
        let send = SendExpression::new(
            "boost_motor_turn_on_for",
            vec![Node::str("A"), Node::int(5)],
        );
        let id = conv.convert(&send).unwrap().expect("rule should match");
        let graph = conv.graph();
        let block = graph.get(&id).unwrap();
        assert_eq!(block.opcode, "boost_motorOnFor");

        let menu = graph.input_block(block, "MOTOR_ID").unwrap();
        assert_eq!(menu.opcode, "boost_menu_MOTOR_ID");
        assert_eq!(menu.field("MOTOR_ID"), Some("A"));
        assert!(menu.shadow);

        let duration = graph.input_block(block, "DURATION").unwrap();
        assert_eq!(duration.opcode, "math_number");
        assert_eq!(duration.field("NUM"), Some("5"));
        assert_eq!(duration.parent.as_deref(), Some(id.as_str()));
    }

    #[test]
    fn explicit_self_receiver_matches() {
        let mut conv = RubyToBlocksConverter::new("Sprite1");
        let send = SendExpression::new(
            "boost_motor_turn_on_for",
            vec![Node::str("B"), Node::float(0.5)],
        )
        .on(Node::SelfRef);
        let id = conv.convert(&send).unwrap().unwrap();
        let graph = conv.graph();
        let block = graph.get(&id).unwrap();
        assert_eq!(graph.input_block(block, "DURATION").unwrap().field("NUM"), Some("0.5"));
    }

    #[test]
    fn other_receiver_does_not_match() {
        let mut conv = RubyToBlocksConverter::new("Sprite1");
        let send = SendExpression::new(
            "boost_motor_turn_on_for",
            vec![Node::str("A"), Node::int(5)],
        )
        .on(Node::lvar("foo"));
        assert_eq!(conv.convert(&send).unwrap(), None);
        assert!(conv.graph().is_empty());
    }

    #[test]
    fn wrong_arity_does_not_match() {
        let mut conv = RubyToBlocksConverter::new("Sprite1");
        let send = SendExpression::new("boost_motor_turn_on_for", vec![Node::str("A")]);
        assert_eq!(conv.convert(&send).unwrap(), None);
        assert!(conv.graph().is_empty());
    }

    #[test]
    fn attached_block_does_not_match() {
        let mut conv = RubyToBlocksConverter::new("Sprite1");
        let send = SendExpression::new(
            "boost_motor_turn_on_for",
            vec![Node::str("A"), Node::int(5)],
        )
        .with_block(vec![], vec![]);
        assert_eq!(conv.convert(&send).unwrap(), None);
    }

    #[test]
    fn expression_duration_keeps_default_shadow() {
        let mut conv = RubyToBlocksConverter::new("Sprite1");
        let sum = Node::send(SendExpression::new("+", vec![Node::int(2)]).on(Node::int(1)));
        let send = SendExpression::new("boost_motor_turn_on_for", vec![Node::str("A"), sum]);
        let id = conv.convert(&send).unwrap().unwrap();
        let graph = conv.graph();
        let input = graph.get(&id).unwrap().input("DURATION").unwrap().clone();
        assert_eq!(graph.get(input.block.as_deref().unwrap()).unwrap().opcode, "operator_add");
        assert_eq!(graph.get(input.shadow.as_deref().unwrap()).unwrap().field("NUM"), Some("1"));
    }

    #[test]
    fn expression_motor_keeps_menu_shadow() {
        let mut conv = RubyToBlocksConverter::new("Sprite1");
        let sum = Node::send(SendExpression::new("+", vec![Node::int(2)]).on(Node::int(1)));
        let send = SendExpression::new("boost_motor_turn_on", vec![sum]);
        let id = conv.convert(&send).unwrap().unwrap();
        let graph = conv.graph();
        let input = graph.get(&id).unwrap().input("MOTOR_ID").unwrap().clone();
        assert_eq!(graph.get(input.block.as_deref().unwrap()).unwrap().opcode, "operator_add");
        let menu = graph.get(input.shadow.as_deref().unwrap()).unwrap();
        assert_eq!(menu.opcode, "boost_menu_MOTOR_ID");
        assert_eq!(menu.field("MOTOR_ID"), Some("A"));
    }

    #[test]
    fn set_power_and_switches() {
        let mut conv = RubyToBlocksConverter::new("Sprite1");
        for (name, args, opcode) in [
            ("boost_motor_turn_on", vec![Node::str("C")], "boost_motorOn"),
            ("boost_motor_turn_off", vec![Node::str("C")], "boost_motorOff"),
            ("boost_set_motor_power", vec![Node::str("C"), Node::int(40)], "boost_setMotorPower"),
            (
                "boost_motor_turn_on_for_rotation",
                vec![Node::str("C"), Node::int(2)],
                "boost_motorOnForRotation",
            ),
        ] {
            let id = conv.convert(&SendExpression::new(name, args)).unwrap().unwrap();
            assert_eq!(conv.graph().get(&id).unwrap().opcode, opcode);
        }
    }
}
