use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn blocks_json_to_ruby(blocks_json: &str) -> Result<String, JsValue> {
    crate::blocks_json_to_ruby(blocks_json).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen]
pub fn ruby_ast_json_to_blocks_json(ast_json: &str, target: &str) -> Result<String, JsValue> {
    crate::ruby_ast_json_to_blocks_json(ast_json, target).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen]
pub fn guidance_json_to_blocks_json(next_steps_json: &str) -> Result<String, JsValue> {
    crate::guidance_json_to_blocks_json(next_steps_json).map_err(|e| JsValue::from_str(&e.to_string()))
}
