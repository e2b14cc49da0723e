//! Сборка итоговой программы из доживших объявлений.

use std::collections::HashSet;

use crate::fir::{FuncDecl, Program, QName};

/// Слить дожившие объявления всех загруженных модулей в одну программу.
///
/// Имена не переписываются: функции и типы сохраняют исходные
/// квалифицированные имена. Список импортов пуст — результат
/// самодостаточен. Оператор выживает, только если выжила его функция.
pub(crate) fn assemble(
    main_name: &str,
    programs: &[Program],
    functions: Vec<FuncDecl>,
    kept_types: &HashSet<QName>,
) -> Program {
    let function_names: HashSet<&QName> = functions.iter().map(|f| &f.name).collect();

    let types = programs
        .iter()
        .flat_map(|p| &p.types)
        .filter(|t| kept_types.contains(t.name()))
        .cloned()
        .collect();

    let operators = programs
        .iter()
        .flat_map(|p| &p.operators)
        .filter(|op| function_names.contains(&op.name))
        .cloned()
        .collect();

    Program {
        name: main_name.to_string(),
        imports: Vec::new(),
        types,
        functions,
        operators,
    }
}
