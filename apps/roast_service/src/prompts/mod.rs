pub mod roast_prompt;
