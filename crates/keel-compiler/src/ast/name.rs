//! Qualified names as they arrive from the parser.
//!
//! A name is `["::"]? section ("::" section)*` where each section is an
//! identifier optionally followed by a bracketed template-argument list.
//! Parse trees carry names; the bound tree carries resolved symbol ids.

/// One `ident` or `ident[args...]` section of a qualified name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSection {
    pub ident: String,
    pub args: Vec<Name>,
}

impl NameSection {
    pub fn new(ident: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(ident: impl Into<String>, args: Vec<Name>) -> Self {
        Self {
            ident: ident.into(),
            args,
        }
    }

    pub fn has_args(&self) -> bool {
        !self.args.is_empty()
    }
}

/// A qualified reference: ordered sections plus a global/relative flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    /// `true` for names written with a leading `::`, resolved from the
    /// global scope instead of the current one.
    pub is_global: bool,
    pub sections: Vec<NameSection>,
}

impl Name {
    pub fn relative(sections: Vec<NameSection>) -> Self {
        Self {
            is_global: false,
            sections,
        }
    }

    pub fn global(sections: Vec<NameSection>) -> Self {
        Self {
            is_global: true,
            sections,
        }
    }

    /// A single-section relative name with no template arguments.
    pub fn ident(ident: impl Into<String>) -> Self {
        Self::relative(vec![NameSection::new(ident)])
    }

    pub fn last(&self) -> &NameSection {
        self.sections.last().expect("name has no sections")
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_global {
            write!(f, "::")?;
        }
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                write!(f, "::")?;
            }
            write!(f, "{}", section.ident)?;
            if section.has_args() {
                write!(f, "[")?;
                for (j, arg) in section.args.iter().enumerate() {
                    if j > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, "]")?;
            }
        }
        Ok(())
    }
}
