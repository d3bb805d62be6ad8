//! Lua scripting surface: registration of math userdata and avatar globals,
//! plus the threaded script runner.

mod bindings;
mod manager;
mod math;

pub use manager::{LuaScriptManager, ScriptReport};
pub use math::{DimensionMethods, LuaMatrix, LuaStack, LuaVector};
