//! Замыкание по типам.
//!
//! Вторая неподвижная точка, запускается строго после обхода функций:
//! к этому моменту множество загруженных модулей зафиксировано, и
//! замыкание идёт только по их объявлениям. Тип обязан выжить, если он
//! базовый, если достигнут любой его конструктор, если он упомянут в
//! сигнатуре выжившей функции или в другом выжившем объявлении типа.

use std::collections::HashSet;

use crate::fir::{default_base_types, QName, TypeDecl};

/// Имена типов данных, хотя бы один конструктор которых достигнут,
/// плюс базовые типы рантайма. Синонимы сюда не попадают: у них нет
/// конструкторов.
pub(crate) fn expand_constructor_owners(
    reached_cons: &HashSet<QName>,
    decls: &[&TypeDecl],
) -> HashSet<QName> {
    let mut owners: HashSet<QName> = default_base_types().into_iter().collect();

    for decl in decls {
        if let TypeDecl::Data {
            name, constructors, ..
        } = decl
        {
            if constructors.iter().any(|c| reached_cons.contains(&c.name)) {
                owners.insert(name.clone());
            }
        }
    }

    owners
}

/// Транзитивное замыкание множества имён типов по ссылкам из объявлений:
/// поля конструкторов для типов данных, разворот для синонимов.
/// Замыкание ограничено переданными объявлениями.
pub(crate) fn required_datatypes(seed: HashSet<QName>, decls: &[&TypeDecl]) -> HashSet<QName> {
    let mut required = seed;

    loop {
        let mut changed = false;
        for decl in decls {
            if !required.contains(decl.name()) {
                continue;
            }
            for name in decl.referenced_type_names() {
                if required.insert(name) {
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }

    required
}
