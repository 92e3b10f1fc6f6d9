use crate::{
    err::{ErrorKind, Handler, Result},
    lex::Span,
    symbol::Symbol,
};
use std::{collections::HashMap, rc::Rc};

use super::hir::{Automation, Entity, Variable};

pub type ScopeId = usize;

/// One lexical frame. Variables and automations live in separate maps, but
/// a name may only be bound once along the whole chain.
#[derive(Debug, Default)]
struct Scope {
    vars: HashMap<Symbol, Rc<Variable>>,
    autos: HashMap<Symbol, Rc<Automation>>,
    parent: Option<ScopeId>,
    in_loop: bool,
    automation: Option<Rc<Automation>>,
}

/// Fields a child frame sets for itself instead of copying them from its
/// parent.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub in_loop: Option<bool>,
    pub automation: Option<Rc<Automation>>,
}

impl Overrides {
    pub fn in_loop() -> Self {
        Self {
            in_loop: Some(true),
            ..Self::default()
        }
    }

    pub fn automation(auto: Rc<Automation>) -> Self {
        Self {
            automation: Some(auto),
            ..Self::default()
        }
    }
}

/// The chain of frames visible from the current point of the walk. Frames
/// are kept in an arena; a child is dropped again when it is exited.
#[derive(Debug)]
pub struct Context {
    scopes: Vec<Scope>,
    current: ScopeId,
    handler: Rc<Handler>,
}

impl Context {
    pub fn new(handler: &Rc<Handler>) -> Self {
        Self {
            scopes: vec![Scope::default()],
            current: 0,
            handler: handler.clone(),
        }
    }

    /// A root frame with the given entities already bound.
    pub fn with_prelude(handler: &Rc<Handler>, prelude: impl IntoIterator<Item = Entity>) -> Self {
        let mut cx = Self::new(handler);
        for entity in prelude {
            cx.insert(entity);
        }
        cx
    }

    /// True if `name` is bound in this frame or any frame enclosing it.
    pub fn sees(&self, name: Symbol) -> bool {
        self.chain()
            .any(|s| s.vars.contains_key(&name) || s.autos.contains_key(&name))
    }

    /// Binds `name` in the current frame. Shadowing is not allowed anywhere,
    /// so the whole chain is checked, not just the current frame.
    pub fn add(&mut self, name: Symbol, entity: Entity, span: Span) -> Result<()> {
        if self.sees(name) {
            return self.handler.mk_err(
                span,
                ErrorKind::ContextAdd,
                format!("Identifier '{}' has already been declared.", name),
            );
        }
        log::trace!("scope {}: add {}", self.current, name);
        self.insert(entity);
        Ok(())
    }

    pub fn lookup(&self, name: Symbol, span: Span) -> Result<Entity> {
        for scope in self.chain() {
            if let Some(v) = scope.vars.get(&name) {
                return Ok(Entity::Variable(v.clone()));
            }
            if let Some(a) = scope.autos.get(&name) {
                return Ok(Entity::Automation(a.clone()));
            }
        }

        self.handler.mk_err(
            span,
            ErrorKind::ContextLookup,
            format!("Identifier '{}' not declared.", name),
        )
    }

    /// Opens a child of the current frame and makes it current. Fields not
    /// overridden are inherited from the parent.
    pub fn new_child(&mut self, overrides: Overrides) -> ScopeId {
        let parent = &self.scopes[self.current];
        let child = Scope {
            vars: HashMap::new(),
            autos: HashMap::new(),
            parent: Some(self.current),
            in_loop: overrides.in_loop.unwrap_or(parent.in_loop),
            automation: overrides.automation.or_else(|| parent.automation.clone()),
        };
        self.scopes.push(child);
        self.current = self.scopes.len() - 1;
        log::trace!("enter scope {}", self.current);
        self.current
    }

    /// Leaves `id`, which must be the current frame, and discards it.
    pub fn exit(&mut self, id: ScopeId) {
        assert_eq!(id, self.current, "scopes must be exited innermost first");
        log::trace!("exit scope {}", id);
        self.current = self.scopes[id].parent.unwrap_or(0);
        self.scopes.truncate(id);
    }

    pub fn in_loop(&self) -> bool {
        self.scopes[self.current].in_loop
    }

    /// The automation whose body is being analyzed, if any.
    pub fn automation(&self) -> Option<&Rc<Automation>> {
        self.scopes[self.current].automation.as_ref()
    }

    pub fn depth(&self) -> usize {
        self.chain().count()
    }

    fn insert(&mut self, entity: Entity) {
        let scope = &mut self.scopes[self.current];
        match entity {
            Entity::Variable(v) => {
                scope.vars.insert(v.name, v);
            }
            Entity::Automation(a) => {
                scope.autos.insert(a.name, a);
            }
        }
    }

    fn chain(&self) -> impl Iterator<Item = &Scope> {
        let scopes = &self.scopes;
        std::iter::successors(Some(&scopes[self.current]), move |s| {
            s.parent.map(|p| &scopes[p])
        })
    }
}
