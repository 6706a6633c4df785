pub mod domain;
pub mod export;
pub mod history;
pub mod inventory;
pub mod ports;
pub mod presenter;
pub mod request;
pub mod response;
pub mod shuffle;

pub use domain::{
    Difficulty, Exam, ExamConfig, ExamHistoryItem, MatchingPair, PendingUpload, Question,
    QuestionCount, QuestionKind, QuestionType, Resource, ResourceCategory,
};
pub use history::ExamHistory;
pub use inventory::ResourceInventory;
pub use ports::{
    ExamGenerationService, HistoryRepository, PortError, PortResult, ResourceAnalysisService,
};
pub use presenter::{ExamPresenter, RenderedExam};
