use super::{EmitterRegistry, Order, RubyGenerator};
use crate::blocks::Block;
use crate::error::EmitError;
use regex::Regex;
use std::sync::OnceLock;

pub(super) fn install(registry: &mut EmitterRegistry) {
    registry.register("math_number", math_number);
    registry.register_aliases(
        &[
            "math_integer",
            "math_whole_number",
            "math_positive_number",
            "math_angle",
        ],
        math_number,
    );
}

fn math_number(_gen: &RubyGenerator<'_>, block: &Block) -> Result<(String, Order), EmitError> {
    let raw = block.field("NUM").ok_or_else(|| EmitError::MissingField {
        block_id: block.id.clone(),
        field: "NUM".to_string(),
    })?;
    Ok(number_literal(parse_float(raw)))
}

/// Ruby literal for `value` and the order it binds at.
pub fn number_literal(value: f64) -> (String, Order) {
    if value == f64::INFINITY {
        ("Float::INFINITY".to_string(), Order::FUNCTION_CALL)
    } else if value == f64::NEG_INFINITY {
        ("-Float::INFINITY".to_string(), Order::UNARY_SIGN)
    } else if value.is_nan() {
        ("Float::NAN".to_string(), Order::FUNCTION_CALL)
    } else if value < 0.0 {
        (format_number(value), Order::UNARY_SIGN)
    } else {
        (format_number(value), Order::ATOMIC)
    }
}

/// Shortest decimal text that reads back as `value`. Integral values carry no
/// fractional part and negative zero prints as `0`.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        format!("{}", value)
    }
}

/// Field text to number the way a browser's `parseFloat` reads it: leading
/// whitespace is skipped, the longest numeric prefix wins, and anything else
/// is NaN.
pub fn parse_float(text: &str) -> f64 {
    static NUMERIC_PREFIX: OnceLock<Regex> = OnceLock::new();
    let re = NUMERIC_PREFIX.get_or_init(|| {
        Regex::new(r"^[+-]?(?:Infinity|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)")
            .expect("numeric prefix pattern is valid")
    });
    let Some(found) = re.find(text.trim_start()) else {
        return f64::NAN;
    };
    let literal = found.as_str();
    match literal.trim_start_matches(['+', '-']) {
        "Infinity" if literal.starts_with('-') => f64::NEG_INFINITY,
        "Infinity" => f64::INFINITY,
        _ => literal.parse::<f64>().unwrap_or(f64::NAN),
    }
}
