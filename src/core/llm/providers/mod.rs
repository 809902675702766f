mod openai;

pub use openai::OpenAiGenerator;
