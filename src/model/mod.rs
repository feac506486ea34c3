pub mod constants;
pub mod domain;
pub mod history;
pub mod rating_engine;
pub mod seeding;
pub mod structures;
