//! Система модулей FIR.
//!
//! Модуль FIR хранится на диске одним JSON-файлом с объявлениями типов,
//! функций и операторов. Загрузка идёт по требованию: модуль читается
//! только тогда, когда цикл достижимости встречает ссылку на него.
//!
//! ## Формат файла
//!
//! ```json
//! {
//!   "name": "arith",
//!   "imports": ["prelude"],
//!   "types": [],
//!   "functions": [
//!     {
//!       "name": { "module": "arith", "name": "double" },
//!       "arity": 1,
//!       "visibility": "Public",
//!       "ty": { "Cons": { "name": { "module": "prelude", "name": "Int" }, "args": [] } },
//!       "rule": { "Rule": { "params": [0], "body": { "Var": 0 } } }
//!     }
//!   ],
//!   "operators": []
//! }
//! ```

mod loader;
mod registry;
mod resolver;

pub use loader::{read_program, write_program, FileLoader, MemoryLoader, ModuleLoader, PrimBinding};
pub use registry::ModuleRegistry;
pub use resolver::{ModuleResolver, ResolveStrategy};
