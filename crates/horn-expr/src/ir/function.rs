//! Functions, basic blocks and modules

use super::{Type, Value, ValueKind, ValueRef};
use std::sync::{Arc, Weak};

pub type FunctionRef = Arc<Function>;
pub type BlockRef = Arc<BasicBlock>;

#[derive(Debug)]
pub struct Function {
    name: String,
    args: Vec<ValueRef>,
    blocks: Vec<BlockRef>,
}

impl Function {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[ValueRef] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> Option<&ValueRef> {
        self.args.get(index)
    }

    pub fn blocks(&self) -> &[BlockRef] {
        &self.blocks
    }

    pub fn block(&self, name: &str) -> Option<&BlockRef> {
        self.blocks.iter().find(|bb| bb.name() == name)
    }

    /// First instruction with the given name, in block order.
    pub fn instruction(&self, name: &str) -> Option<&ValueRef> {
        self.blocks
            .iter()
            .flat_map(|bb| bb.instructions())
            .find(|inst| inst.name() == Some(name))
    }
}

#[derive(Debug)]
pub struct BasicBlock {
    name: String,
    parent: Weak<Function>,
    insts: Vec<ValueRef>,
}

impl BasicBlock {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enclosing function, if it is still alive.
    pub fn parent(&self) -> Option<FunctionRef> {
        self.parent.upgrade()
    }

    pub fn instructions(&self) -> &[ValueRef] {
        &self.insts
    }
}

struct InstSpec {
    name: Option<String>,
    ty: Type,
    text: String,
}

struct BlockSpec {
    name: String,
    insts: Vec<InstSpec>,
}

/// Builds a function together with its arguments, blocks and instructions.
///
/// Parent links are weak: keep the returned [`FunctionRef`] alive for as long
/// as its values need to know where they live.
///
/// ```
/// use horn_expr::ir::{FunctionBuilder, Type};
///
/// let f = FunctionBuilder::new("main")
///     .arg("n", Type::Int(32))
///     .block("entry")
///     .inst(Some("x"), Type::Int(32), "add i32 %n, 1")
///     .build();
/// assert_eq!(f.instruction("x").unwrap().parent_function().unwrap().name(), "main");
/// ```
pub struct FunctionBuilder {
    name: String,
    args: Vec<(Option<String>, Type)>,
    blocks: Vec<BlockSpec>,
}

impl FunctionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            blocks: Vec::new(),
        }
    }

    pub fn arg(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.args.push((Some(name.into()), ty));
        self
    }

    pub fn unnamed_arg(mut self, ty: Type) -> Self {
        self.args.push((None, ty));
        self
    }

    /// Start a new basic block; following instructions go into it.
    pub fn block(mut self, name: impl Into<String>) -> Self {
        self.blocks.push(BlockSpec {
            name: name.into(),
            insts: Vec::new(),
        });
        self
    }

    /// Append an instruction to the current block (an `entry` block is
    /// opened if there is none yet).
    pub fn inst(mut self, name: Option<&str>, ty: Type, text: impl Into<String>) -> Self {
        if self.blocks.is_empty() {
            self = self.block("entry");
        }
        if let Some(bb) = self.blocks.last_mut() {
            bb.insts.push(InstSpec {
                name: name.map(str::to_string),
                ty,
                text: text.into(),
            });
        }
        self
    }

    pub fn build(self) -> FunctionRef {
        let FunctionBuilder { name, args, blocks } = self;
        Arc::new_cyclic(move |func: &Weak<Function>| {
            let args = args
                .into_iter()
                .enumerate()
                .map(|(index, (name, ty))| {
                    Arc::new(Value::new(
                        name,
                        ty,
                        ValueKind::Argument {
                            parent: func.clone(),
                            index,
                        },
                    ))
                })
                .collect();
            let blocks = blocks
                .into_iter()
                .map(|spec| {
                    Arc::new_cyclic(move |bb: &Weak<BasicBlock>| BasicBlock {
                        name: spec.name,
                        parent: func.clone(),
                        insts: spec
                            .insts
                            .into_iter()
                            .map(|inst| {
                                Arc::new(Value::new(
                                    inst.name,
                                    inst.ty,
                                    ValueKind::Instruction {
                                        parent: bb.clone(),
                                        text: inst.text,
                                    },
                                ))
                            })
                            .collect(),
                    })
                })
                .collect();
            Function { name, args, blocks }
        })
    }
}

/// A named collection of functions and globals.
#[derive(Debug, Default)]
pub struct Module {
    name: String,
    functions: Vec<FunctionRef>,
    globals: Vec<ValueRef>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_function(&mut self, builder: FunctionBuilder) -> FunctionRef {
        let func = builder.build();
        self.functions.push(Arc::clone(&func));
        func
    }

    pub fn add_global(&mut self, name: impl Into<String>, ty: Type) -> ValueRef {
        let global = Value::global(name, ty);
        self.globals.push(Arc::clone(&global));
        global
    }

    pub fn function(&self, name: &str) -> Option<&FunctionRef> {
        self.functions.iter().find(|f| f.name() == name)
    }

    pub fn global(&self, name: &str) -> Option<&ValueRef> {
        self.globals.iter().find(|g| g.name() == Some(name))
    }

    pub fn functions(&self) -> &[FunctionRef] {
        &self.functions
    }

    pub fn globals(&self) -> &[ValueRef] {
        &self.globals
    }
}
