pub mod language_llm;
pub mod passage_llm;

pub use language_llm::OpenAiLanguageAdapter;
pub use passage_llm::OpenAiPassageAdapter;
