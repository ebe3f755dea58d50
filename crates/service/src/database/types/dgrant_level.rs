use common::access::GrantLevel;
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::sqlite::{SqliteArgumentValue, SqliteTypeInfo, SqliteValueRef};
use sqlx::{Decode, Encode, Sqlite, Type};

/// Database-compatible grant level wrapper, stored as lowercase TEXT
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DGrantLevel(GrantLevel);

impl From<DGrantLevel> for GrantLevel {
    fn from(val: DGrantLevel) -> Self {
        val.0
    }
}

impl From<GrantLevel> for DGrantLevel {
    fn from(level: GrantLevel) -> Self {
        Self(level)
    }
}

impl std::ops::Deref for DGrantLevel {
    type Target = GrantLevel;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Decode<'_, Sqlite> for DGrantLevel {
    fn decode(value: SqliteValueRef<'_>) -> Result<Self, BoxDynError> {
        let s = <String as Decode<Sqlite>>::decode(value)?;
        let level = s.parse::<GrantLevel>()?;
        Ok(Self(level))
    }
}

impl Encode<'_, Sqlite> for DGrantLevel {
    fn encode_by_ref(
        &self,
        args: &mut Vec<SqliteArgumentValue<'_>>,
    ) -> Result<IsNull, BoxDynError> {
        args.push(SqliteArgumentValue::Text(self.0.as_str().into()));
        Ok(IsNull::No)
    }
}

impl Type<Sqlite> for DGrantLevel {
    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <String as Type<Sqlite>>::compatible(ty)
    }

    fn type_info() -> SqliteTypeInfo {
        <String as Type<Sqlite>>::type_info()
    }
}

impl std::fmt::Display for DGrantLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
