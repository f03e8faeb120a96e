use crate::utils::error::Result;

/// 持久層的邊界：以路徑讀寫模板與環境文字
pub trait Storage {
    fn read_to_string(&self, path: &str) -> Result<String>;
    fn write_string(&self, path: &str, contents: &str) -> Result<()>;

    fn exists(&self, path: &str) -> bool;
}
