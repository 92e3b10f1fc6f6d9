use crate::symbol::Symbol;
use std::rc::Rc;

use super::{
    hir::{Automation, Entity, Param, Variable},
    ty::Ty,
};

/// Fresh copies of the built-in variables and automations. Each compile
/// gets its own, so nothing is shared between compiles.
pub fn prelude() -> Vec<Entity> {
    vec![
        auto("append", &[("element", Ty::Any), ("list", Ty::List)], Ty::None),
        auto("remove", &[("element", Ty::Any), ("list", Ty::List)], Ty::None),
        auto("length", &[("value", Ty::Any)], Ty::Num),
        auto("range", &[("start", Ty::Num), ("end", Ty::Num)], Ty::List),
        auto("type", &[("value", Ty::Any)], Ty::Word),
        var("π", Ty::Num),
        var("inf", Ty::Num),
        var("true", Ty::Bool),
        var("false", Ty::Bool),
    ]
}

fn var(name: &str, ty: Ty) -> Entity {
    let mut v = Variable::new(Symbol::intern(name), true, ty);
    v.builtin = true;
    Entity::Variable(Rc::new(v))
}

fn auto(name: &str, params: &[(&str, Ty)], ty: Ty) -> Entity {
    let params = params
        .iter()
        .map(|&(name, ty)| Param {
            name: Symbol::intern(name),
            ty,
        })
        .collect();
    let mut a = Automation::new(Symbol::intern(name), params, ty);
    a.builtin = true;
    Entity::Automation(Rc::new(a))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signatures() {
        let prelude = prelude();
        let find = |name: &str| {
            prelude
                .iter()
                .find(|e| e.name().as_str() == name)
                .cloned()
                .unwrap()
        };

        match find("range") {
            Entity::Automation(a) => {
                assert_eq!(a.params.len(), 2);
                assert_eq!(a.ty, Ty::List);
                assert!(a.builtin);
            }
            other => panic!("{:?}", other),
        }
        match find("true") {
            Entity::Variable(v) => {
                assert_eq!(v.ty, Ty::Bool);
                assert!(v.read_only);
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn no_automation_outputs_any() {
        for e in prelude() {
            if let Entity::Automation(a) = e {
                assert_ne!(a.ty, Ty::Any, "{}", a.name);
            }
        }
    }

    #[test]
    fn each_call_is_fresh() {
        let a = prelude();
        let b = prelude();
        match (&a[0], &b[0]) {
            (Entity::Automation(x), Entity::Automation(y)) => assert!(!Rc::ptr_eq(x, y)),
            _ => unreachable!(),
        }
    }
}
