use super::{EmitterRegistry, Order, RubyGenerator};
use crate::blocks::Block;
use crate::error::EmitError;

pub(super) fn install(registry: &mut EmitterRegistry) {
    registry.register("control_wait", control_wait);
    registry.register("control_repeat", control_repeat);
    registry.register("control_forever", control_forever);
    registry.register("control_if", control_if);
    registry.register("control_if_else", control_if_else);
    registry.register("control_repeat_until", control_repeat_until);
}

fn control_wait(gen: &RubyGenerator<'_>, block: &Block) -> Result<(String, Order), EmitError> {
    let secs = gen.value_or(block, "DURATION", Order::NONE, "0")?;
    Ok((format!("sleep({})\n", secs), Order::NONE))
}

fn control_repeat(gen: &RubyGenerator<'_>, block: &Block) -> Result<(String, Order), EmitError> {
    let times = gen.value_or(block, "TIMES", Order::MEMBER, "0")?;
    let body = gen.statement_to_code(block, "SUBSTACK")?;
    Ok((format!("{}.times do\n{}end\n", times, body), Order::NONE))
}

fn control_forever(gen: &RubyGenerator<'_>, block: &Block) -> Result<(String, Order), EmitError> {
    let body = gen.statement_to_code(block, "SUBSTACK")?;
    Ok((format!("loop do\n{}end\n", body), Order::NONE))
}

fn control_if(gen: &RubyGenerator<'_>, block: &Block) -> Result<(String, Order), EmitError> {
    let cond = gen.value_or(block, "CONDITION", Order::NONE, "false")?;
    let body = gen.statement_to_code(block, "SUBSTACK")?;
    Ok((format!("if {}\n{}end\n", cond, body), Order::NONE))
}

fn control_if_else(gen: &RubyGenerator<'_>, block: &Block) -> Result<(String, Order), EmitError> {
    let cond = gen.value_or(block, "CONDITION", Order::NONE, "false")?;
    let then_body = gen.statement_to_code(block, "SUBSTACK")?;
    let else_body = gen.statement_to_code(block, "SUBSTACK2")?;
    Ok((
        format!("if {}\n{}else\n{}end\n", cond, then_body, else_body),
        Order::NONE,
    ))
}

fn control_repeat_until(gen: &RubyGenerator<'_>, block: &Block) -> Result<(String, Order), EmitError> {
    let cond = gen.value_or(block, "CONDITION", Order::NONE, "false")?;
    let body = gen.statement_to_code(block, "SUBSTACK")?;
    Ok((format!("until {}\n{}end\n", cond, body), Order::NONE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{BlockGraph, Input};
    use crate::ruby_generator::test_support::{number, reporter, statement};

    #[test]
    fn repeat_indents_its_body() {
        let mut graph = BlockGraph::new();
        number(&mut graph, "times", "3");
        number(&mut graph, "one", "1");
        number(&mut graph, "two", "2");
        statement(&mut graph, "w1", "control_wait", &[("DURATION", "one")]);
        statement(&mut graph, "w2", "control_wait", &[("DURATION", "two")]);
        graph.set_next("w1", Some("w2".to_string())).unwrap();
        statement(&mut graph, "rep", "control_repeat", &[("TIMES", "times"), ("SUBSTACK", "w1")]);
        let code = RubyGenerator::new(&graph).script_to_code("rep").unwrap();
        assert_eq!(code, "3.times do\n  sleep(1)\n  sleep(2)\nend\n");
    }

    #[test]
    fn negative_repeat_count_is_wrapped() {
        let mut graph = BlockGraph::new();
        number(&mut graph, "times", "-1");
        statement(&mut graph, "rep", "control_repeat", &[("TIMES", "times")]);
        let code = RubyGenerator::new(&graph).script_to_code("rep").unwrap();
        assert_eq!(code, "(-1).times do\nend\n");
    }

    #[test]
    fn nested_if_else_inside_forever() {
        let mut graph = BlockGraph::new();
        number(&mut graph, "a", "1");
        number(&mut graph, "b", "2");
        number(&mut graph, "s", "0.5");
        reporter(&mut graph, "lt", "operator_lt", &[("OPERAND1", "a"), ("OPERAND2", "b")]);
        statement(&mut graph, "wait", "control_wait", &[("DURATION", "s")]);
        statement(&mut graph, "branch", "control_if_else", &[("CONDITION", "lt")]);
        graph
            .set_input("branch", "SUBSTACK2", Input::block("wait"))
            .unwrap();
        statement(&mut graph, "loop", "control_forever", &[("SUBSTACK", "branch")]);
        let code = RubyGenerator::new(&graph).script_to_code("loop").unwrap();
        assert_eq!(
            code,
            "loop do\n  if 1 < 2\n  else\n    sleep(0.5)\n  end\nend\n"
        );
    }

    #[test]
    fn empty_condition_defaults_to_false() {
        let mut graph = BlockGraph::new();
        statement(&mut graph, "until", "control_repeat_until", &[]);
        let code = RubyGenerator::new(&graph).script_to_code("until").unwrap();
        assert_eq!(code, "until false\nend\n");
    }
}
