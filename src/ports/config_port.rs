//! Configuration access port trait.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// `None` when the key is missing or is not a recognised boolean.
    fn get_bool_opt(&self, section: &str, key: &str) -> Option<bool>;

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.get_bool_opt(section, key).unwrap_or(default)
    }
}
