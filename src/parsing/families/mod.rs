//! One `LanguageBehavior` implementation per language family (spec §4.4).
//!
//! Rust, Python, and JavaScript/TypeScript get dedicated implementations
//! because spec.md's worked scenarios (§8 S1-S6) exercise them directly.
//! The remaining brace languages (Go, Java, Kotlin, PHP, C#, C++, C, Swift)
//! share one table-driven implementation since their class/function/call
//! grammar shapes are close enough to parameterize (§9 design note); Lua,
//! Clojure, and GDScript get small bespoke ones.

pub mod c_family;
pub mod clojure;
pub mod gdscript;
pub mod javascript;
pub mod lua;
pub mod python;
pub mod rust;

use crate::parsing::behavior::LanguageBehavior;
use crate::types::Language;
use std::sync::Arc;

/// Resolve the `LanguageBehavior` implementation for `language`.
pub fn behavior_for(language: Language) -> Arc<dyn LanguageBehavior> {
    match language {
        Language::Rust => Arc::new(rust::RustBehavior),
        Language::Python => Arc::new(python::PythonBehavior),
        Language::JavaScript => Arc::new(javascript::JavaScriptBehavior::javascript()),
        Language::TypeScript => Arc::new(javascript::JavaScriptBehavior::typescript()),
        Language::Go => Arc::new(c_family::CFamilyBehavior::go()),
        Language::Java => Arc::new(c_family::CFamilyBehavior::java()),
        Language::Kotlin => Arc::new(c_family::CFamilyBehavior::kotlin()),
        Language::Php => Arc::new(c_family::CFamilyBehavior::php()),
        Language::CSharp => Arc::new(c_family::CFamilyBehavior::csharp()),
        Language::Cpp => Arc::new(c_family::CFamilyBehavior::cpp()),
        Language::C => Arc::new(c_family::CFamilyBehavior::c()),
        Language::Swift => Arc::new(c_family::CFamilyBehavior::swift()),
        Language::Lua => Arc::new(lua::LuaBehavior),
        Language::Clojure => Arc::new(clojure::ClojureBehavior),
        Language::GdScript => Arc::new(gdscript::GdScriptBehavior),
    }
}
