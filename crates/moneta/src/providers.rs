pub mod base;
pub mod gemini;

#[cfg(test)]
pub mod mock;
