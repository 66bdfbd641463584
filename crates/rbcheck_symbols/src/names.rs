//! Well-known names.
//!
//! Names the namer and later passes compare against constantly: DSL method
//! names, synthesized argument names, and the names of the well-known
//! symbols. Interned once when the symbol table is created so comparisons
//! stay O(1) handle equality.

use rbcheck_core::intern::{NameRef, NameTable};

#[derive(Debug, Clone)]
pub struct Names {
    // Mixin and visibility DSLs.
    pub include: NameRef,
    pub extend: NameRef,
    pub private: NameRef,
    pub private_class_method: NameRef,
    pub protected: NameRef,
    pub public: NameRef,
    pub module_function: NameRef,
    pub alias_method: NameRef,

    // Type DSLs.
    pub type_member: NameRef,
    pub type_template: NameRef,
    pub type_alias: NameRef,
    pub declare_abstract: NameRef,
    pub declare_interface: NameRef,

    // Variance symbols (long and short spellings) and the `fixed:` hash key.
    pub covariant: NameRef,
    pub contravariant: NameRef,
    pub invariant: NameRef,
    pub out_: NameRef,
    pub in_: NameRef,
    pub fixed: NameRef,

    // Blocks and calls.
    pub block_given: NameRef,
    pub call: NameRef,
    pub unsafe_: NameRef,

    // Synthesized names. The angle brackets keep them from colliding with
    // anything a programmer can write.
    pub blk_arg: NameRef,
    pub singleton: NameRef,
    pub block_temp: NameRef,
    pub arg: NameRef,
    pub static_init: NameRef,

    // Names of the well-known symbols.
    pub root: NameRef,
    pub todo: NameRef,
    pub object: NameRef,
    pub basic_object: NameRef,
    pub magic: NameRef,
}

impl Names {
    pub fn new(names: &NameTable) -> Self {
        Self {
            include: names.intern_static("include"),
            extend: names.intern_static("extend"),
            private: names.intern_static("private"),
            private_class_method: names.intern_static("private_class_method"),
            protected: names.intern_static("protected"),
            public: names.intern_static("public"),
            module_function: names.intern_static("module_function"),
            alias_method: names.intern_static("alias_method"),

            type_member: names.intern_static("type_member"),
            type_template: names.intern_static("type_template"),
            type_alias: names.intern_static("type_alias"),
            declare_abstract: names.intern_static("abstract!"),
            declare_interface: names.intern_static("interface!"),

            covariant: names.intern_static("covariant"),
            contravariant: names.intern_static("contravariant"),
            invariant: names.intern_static("invariant"),
            out_: names.intern_static("out"),
            in_: names.intern_static("in"),
            fixed: names.intern_static("fixed"),

            block_given: names.intern_static("block_given?"),
            call: names.intern_static("call"),
            unsafe_: names.intern_static("unsafe"),

            blk_arg: names.intern_static("<blk>"),
            singleton: names.intern_static("<singleton>"),
            block_temp: names.intern_static("<blockTemp>"),
            arg: names.intern_static("arg"),
            static_init: names.intern_static("<static-init>"),

            root: names.intern_static("<root>"),
            todo: names.intern_static("<todo>"),
            object: names.intern_static("Object"),
            basic_object: names.intern_static("BasicObject"),
            magic: names.intern_static("<Magic>"),
        }
    }
}
