use common::share::AuditKind;
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::sqlite::{SqliteArgumentValue, SqliteTypeInfo, SqliteValueRef};
use sqlx::{Decode, Encode, Sqlite, Type};

/// Database-compatible audit kind wrapper, stored as snake_case TEXT
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DAuditKind(AuditKind);

impl From<DAuditKind> for AuditKind {
    fn from(val: DAuditKind) -> Self {
        val.0
    }
}

impl From<AuditKind> for DAuditKind {
    fn from(kind: AuditKind) -> Self {
        Self(kind)
    }
}

impl std::ops::Deref for DAuditKind {
    type Target = AuditKind;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Decode<'_, Sqlite> for DAuditKind {
    fn decode(value: SqliteValueRef<'_>) -> Result<Self, BoxDynError> {
        let s = <String as Decode<Sqlite>>::decode(value)?;
        let kind = s.parse::<AuditKind>()?;
        Ok(Self(kind))
    }
}

impl Encode<'_, Sqlite> for DAuditKind {
    fn encode_by_ref(
        &self,
        args: &mut Vec<SqliteArgumentValue<'_>>,
    ) -> Result<IsNull, BoxDynError> {
        args.push(SqliteArgumentValue::Text(self.0.as_str().into()));
        Ok(IsNull::No)
    }
}

impl Type<Sqlite> for DAuditKind {
    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <String as Type<Sqlite>>::compatible(ty)
    }

    fn type_info() -> SqliteTypeInfo {
        <String as Type<Sqlite>>::type_info()
    }
}

impl std::fmt::Display for DAuditKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
