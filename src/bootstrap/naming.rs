//! Module naming convention.

/// Maps a module id to the class name its entry file declares.
pub type ModuleNaming = fn(&str) -> String;

/// Suffix appended to module class names.
pub const MODULE_CLASS_SUFFIX: &str = "Module";

/// Default naming: upper-case the first character and append `Module`.
///
/// # Examples
/// - `"blog"` -> `"BlogModule"`
/// - `"user_profile"` -> `"User_profileModule"`
pub fn module_class_name(module_id: &str) -> String {
    let mut chars = module_id.chars();
    let mut name = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    name.push_str(MODULE_CLASS_SUFFIX);
    name
}
