pub mod baidu;
pub mod deepseek;
pub mod html;
pub mod ollama;
pub mod qdrant;
pub mod title;
pub mod translator;
pub mod url_norm;
