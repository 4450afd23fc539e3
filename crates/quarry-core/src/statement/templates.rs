//! Mode and clause templates with per-dialect overrides

use super::Mode;
use crate::dialect::Dialect;

/// A default template plus dialect-specific replacements
#[derive(Debug, Clone, Copy)]
pub struct TemplateSet {
    pub default: &'static str,
    pub overrides: &'static [(Dialect, &'static str)],
}

impl TemplateSet {
    pub const fn new(default: &'static str) -> Self {
        Self {
            default,
            overrides: &[],
        }
    }

    pub fn resolve(&self, dialect: Dialect) -> &'static str {
        self.overrides
            .iter()
            .find(|(d, _)| *d == dialect)
            .map(|(_, template)| *template)
            .unwrap_or(self.default)
    }
}

const SELECT: TemplateSet = TemplateSet::new(
    "select[option] [field][from][join][where][group][having][order][limit]",
);

const INSERT: TemplateSet = TemplateSet {
    default: "insert[option] into [table_noalias] ([set_fields]) values ([set_values])",
    // An explicit id colliding with an identity column raises 544; retry
    // the same insert with IDENTITY_INSERT switched on.
    overrides: &[(
        Dialect::Mssql,
        "begin try insert[option] into [table_noalias] ([set_fields]) values ([set_values]); end try \
         begin catch if ERROR_NUMBER() = 544 begin \
         set IDENTITY_INSERT [table_noalias] on; \
         begin try insert[option] into [table_noalias] ([set_fields]) values ([set_values]); \
         set IDENTITY_INSERT [table_noalias] off; end try \
         begin catch set IDENTITY_INSERT [table_noalias] off; throw; end catch \
         end else begin throw; end end catch",
    )],
};

const REPLACE: TemplateSet = TemplateSet {
    default: "replace[option] into [table_noalias] ([set_fields]) values ([set_values])",
    overrides: &[(
        Dialect::Sqlite,
        "insert or replace[option] into [table_noalias] ([set_fields]) values ([set_values])",
    )],
};

const UPDATE: TemplateSet = TemplateSet::new("update [table_noalias] set [set][where]");

const DELETE: TemplateSet = TemplateSet::new("delete from [table_noalias][where]");

const TRUNCATE: TemplateSet = TemplateSet {
    default: "truncate table [table_noalias]",
    overrides: &[(Dialect::Sqlite, "delete from [table_noalias]")],
};

/// Row limiting; `count` and `skip` are bound as parameters
pub const LIMIT: TemplateSet = TemplateSet {
    default: " limit [count] offset [skip]",
    overrides: &[
        (Dialect::MySql, " limit [skip], [count]"),
        (Dialect::Mssql, " offset [skip] rows fetch next [count] rows only"),
        (Dialect::Oracle, " offset [skip] rows fetch next [count] rows only"),
    ],
};

/// Aggregate string concatenation over a group
pub const GROUP_CONCAT: TemplateSet = TemplateSet {
    default: "string_agg({{field}}, [delimiter])",
    overrides: &[
        (Dialect::MySql, "group_concat({{field}} separator [delimiter])"),
        (Dialect::Sqlite, "group_concat({{field}}, [delimiter])"),
        (
            Dialect::Oracle,
            "listagg({{field}}, [delimiter]) within group (order by {{field}})",
        ),
    ],
};

pub fn mode_template(mode: Mode) -> &'static TemplateSet {
    match mode {
        Mode::Select => &SELECT,
        Mode::Insert => &INSERT,
        Mode::Replace => &REPLACE,
        Mode::Update => &UPDATE,
        Mode::Delete => &DELETE,
        Mode::Truncate => &TRUNCATE,
    }
}
