//! Declaration records: the boundary to the parsing stage.
//!
//! The parser hands over plain data: identifiers, ranges, flags and
//! unresolved type references ([`TypeNode`]). The resolver turns them into
//! arena entries. Library declarations manufactured from signature strings
//! arrive through the very same shapes.

use crate::members::Visibility;
use diagnostics::Range;

/// An unresolved type reference as written in source: an identifier,
/// optional type arguments and array brackets. The identifier `?` is a
/// wildcard; its bounds live in `wildcard_upper`/`wildcard_lower`.
#[derive(Debug, Clone, Default)]
pub struct TypeNode {
    pub identifier: String,
    pub type_args: Vec<TypeNode>,
    pub array_dims: usize,
    pub wildcard_upper: Vec<TypeNode>,
    pub wildcard_lower: Option<Box<TypeNode>>,
    pub range: Range,
}

impl TypeNode {
    pub fn named(identifier: &str) -> TypeNode {
        TypeNode {
            identifier: identifier.to_string(),
            ..TypeNode::default()
        }
    }

    /// `? extends bound`
    pub fn wildcard_extends(bound: TypeNode) -> TypeNode {
        TypeNode {
            identifier: "?".to_string(),
            wildcard_upper: vec![bound],
            ..TypeNode::default()
        }
    }

    /// `? super bound`
    pub fn wildcard_super(bound: TypeNode) -> TypeNode {
        TypeNode {
            identifier: "?".to_string(),
            wildcard_lower: Some(Box::new(bound)),
            ..TypeNode::default()
        }
    }

    pub fn generic(identifier: &str, type_args: Vec<TypeNode>) -> TypeNode {
        TypeNode {
            identifier: identifier.to_string(),
            type_args,
            ..TypeNode::default()
        }
    }

    pub fn array(identifier: &str, array_dims: usize) -> TypeNode {
        TypeNode {
            identifier: identifier.to_string(),
            array_dims,
            ..TypeNode::default()
        }
    }
}

/// `T extends B1 & B2 super C`. Wildcards use the identifier `?`.
#[derive(Debug, Clone, Default)]
pub struct GenericParamDecl {
    pub identifier: String,
    pub range: Range,
    pub upper_bounds: Vec<TypeNode>,
    pub lower_bound: Option<TypeNode>,
}

impl GenericParamDecl {
    pub fn named(identifier: &str) -> GenericParamDecl {
        GenericParamDecl {
            identifier: identifier.to_string(),
            ..GenericParamDecl::default()
        }
    }

    pub fn bounded(identifier: &str, upper_bounds: Vec<TypeNode>) -> GenericParamDecl {
        GenericParamDecl {
            identifier: identifier.to_string(),
            upper_bounds,
            ..GenericParamDecl::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub identifier: String,
    pub range: Range,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
    pub ty: TypeNode,
}

impl FieldDecl {
    pub fn new(identifier: &str, ty: TypeNode) -> FieldDecl {
        FieldDecl {
            identifier: identifier.to_string(),
            range: Range::EMPTY,
            visibility: Visibility::Public,
            is_static: false,
            is_final: false,
            ty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub identifier: String,
    pub range: Range,
    pub ty: TypeNode,
    pub is_final: bool,
    pub is_ellipsis: bool,
}

impl ParamDecl {
    pub fn new(identifier: &str, ty: TypeNode) -> ParamDecl {
        ParamDecl {
            identifier: identifier.to_string(),
            range: Range::EMPTY,
            ty,
            is_final: false,
            is_ellipsis: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MethodDecl {
    pub identifier: String,
    pub range: Range,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
    pub is_abstract: bool,
    pub is_default: bool,
    pub is_constructor: bool,
    pub generics: Vec<GenericParamDecl>,
    pub params: Vec<ParamDecl>,
    /// `None` declares a void result.
    pub return_ty: Option<TypeNode>,
}

impl MethodDecl {
    pub fn new(identifier: &str) -> MethodDecl {
        MethodDecl {
            identifier: identifier.to_string(),
            ..MethodDecl::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClassDecl {
    pub identifier: String,
    pub range: Range,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_final: bool,
    pub generics: Vec<GenericParamDecl>,
    pub extends: Option<TypeNode>,
    pub implements: Vec<TypeNode>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
}

impl ClassDecl {
    pub fn new(identifier: &str) -> ClassDecl {
        ClassDecl {
            identifier: identifier.to_string(),
            ..ClassDecl::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InterfaceDecl {
    pub identifier: String,
    pub range: Range,
    pub visibility: Visibility,
    pub generics: Vec<GenericParamDecl>,
    pub extends: Vec<TypeNode>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
}

impl InterfaceDecl {
    pub fn new(identifier: &str) -> InterfaceDecl {
        InterfaceDecl {
            identifier: identifier.to_string(),
            ..InterfaceDecl::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnumDecl {
    pub identifier: String,
    pub range: Range,
    pub visibility: Visibility,
    pub implements: Vec<TypeNode>,
    /// The declared constants, in order.
    pub values: Vec<(String, Range)>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
}

impl EnumDecl {
    pub fn new(identifier: &str) -> EnumDecl {
        EnumDecl {
            identifier: identifier.to_string(),
            ..EnumDecl::default()
        }
    }
}

#[derive(Debug, Clone)]
pub enum TypeDecl {
    Class(ClassDecl),
    Interface(InterfaceDecl),
    Enum(EnumDecl),
}
