/// Test fixtures for shares
///
/// Builders for the common shapes test scenarios need: a share with some
/// mix of grants, a public link, and a password. Plaintext passwords stay
/// with the test; the fixture hashes them the same way production does.
///
/// # Example
///
/// ```rust,ignore
/// use common::testkit::{user, ShareFixture};
///
/// let reader = user();
/// let share = ShareFixture::new()
///     .public()
///     .with_password("swordfish")
///     .granting(reader, GrantLevel::Read)
///     .build();
/// ```
mod fixtures;

pub use fixtures::{user, ShareFixture};
