use rubyblocks_rs_core::blocks::BlockGraph;
use rubyblocks_rs_core::ruby_ast::{Node, SendExpression};
use rubyblocks_rs_core::ruby_generator::RubyGenerator;
use rubyblocks_rs_core::ruby_to_blocks::StatementOutcome;
use rubyblocks_rs_core::{blocks_to_ruby, ruby_ast_to_blocks};

fn send(name: &str, args: Vec<Node>) -> Node {
    Node::send(SendExpression::new(name, args))
}

/// Ruby text of the single script a program converts to.
fn reemit(program: &[Node]) -> String {
    let conversion = ruby_ast_to_blocks(program, "Sprite1");
    assert!(conversion.is_complete(), "{:?}", conversion.outcomes);
    blocks_to_ruby(&conversion.graph)
}

#[test]
fn converted_calls_reemit_equivalent_ruby() {
    let cases = [
        (
            send("boost_motor_turn_on_for", vec![Node::str("A"), Node::int(5)]),
            "boost_motor_turn_on_for(\"A\", 5)\n",
        ),
        (
            send("boost_set_motor_power", vec![Node::str("B"), Node::float(37.5)]),
            "boost_set_motor_power(\"B\", 37.5)\n",
        ),
        (send("boost_motor_turn_off", vec![Node::str("AB")]), "boost_motor_turn_off(\"AB\")\n"),
        (send("sleep", vec![Node::float(0.25)]), "sleep(0.25)\n"),
    ];
    for (call, expected) in cases {
        assert_eq!(reemit(&[call]), expected);
    }
}

#[test]
fn times_and_sleep_survive_the_round_trip() {
    let program = [Node::send(
        SendExpression::new("times", vec![])
            .on(Node::int(10))
            .with_block(vec![], vec![send("sleep", vec![Node::int(1)])]),
    )];
    assert_eq!(reemit(&program), "10.times do\n  sleep(1)\nend\n");
}

#[test]
fn expressions_keep_their_grouping() {
    let sum = Node::send(SendExpression::new("+", vec![Node::int(2)]).on(Node::int(1)));
    let product = Node::send(SendExpression::new("*", vec![Node::int(3)]).on(sum));
    assert_eq!(reemit(&[send("sleep", vec![product])]), "sleep((1 + 2) * 3)\n");

    let product = Node::send(SendExpression::new("*", vec![Node::int(3)]).on(Node::int(2)));
    let sum = Node::send(SendExpression::new("+", vec![product]).on(Node::int(1)));
    assert_eq!(reemit(&[send("sleep", vec![sum])]), "sleep(1 + 2 * 3)\n");
}

#[test]
fn if_else_round_trip() {
    let cond = Node::send(SendExpression::new(">", vec![Node::int(1)]).on(Node::int(2)));
    let program = [Node::If {
        cond: Box::new(cond),
        then_body: vec![send("boost_motor_turn_on", vec![Node::str("A")])],
        else_body: Some(vec![send("boost_motor_turn_off", vec![Node::str("A")])]),
    }];
    assert_eq!(
        reemit(&program),
        "if 2 > 1\n  boost_motor_turn_on(\"A\")\nelse\n  boost_motor_turn_off(\"A\")\nend\n"
    );
}

#[test]
fn middle_statement_unrecognized() {
    let program = [
        send("boost_motor_turn_on_for", vec![Node::str("A"), Node::int(5)]),
        send("teleport_home", vec![]),
        send("boost_motor_turn_off", vec![Node::str("A")]),
    ];
    let conversion = ruby_ast_to_blocks(&program, "Sprite1");
    assert_eq!(conversion.converted().count(), 2);
    assert!(matches!(
        &conversion.outcomes[1],
        StatementOutcome::Unrecognized { source } if source == "teleport_home"
    ));
    assert_eq!(
        blocks_to_ruby(&conversion.graph),
        "boost_motor_turn_on_for(\"A\", 5)\nboost_motor_turn_off(\"A\")\n"
    );
}

#[test]
fn graph_json_reload_matches_generated_ruby() {
    let program = [Node::send(
        SendExpression::new("when", vec![Node::sym("flag_clicked")]).with_block(
            vec![],
            vec![Node::send(SendExpression::new("loop", vec![]).with_block(
                vec![],
                vec![send("boost_motor_turn_on_for_rotation", vec![Node::str("C"), Node::int(-2)])],
            ))],
        ),
    )];
    let conversion = ruby_ast_to_blocks(&program, "Sprite1");
    let reloaded = BlockGraph::from_json(&conversion.graph.to_json()).unwrap();
    let expected = "self.when(:flag_clicked) do\n  loop do\n    boost_motor_turn_on_for_rotation(\"C\", -2)\n  end\nend\n";
    assert_eq!(RubyGenerator::new(&conversion.graph).workspace_to_code(), expected);
    assert_eq!(blocks_to_ruby(&reloaded), expected);
}
