pub mod history_file;
pub mod inference;

pub use history_file::JsonFileHistoryRepository;
pub use inference::OpenAiInferenceAdapter;
