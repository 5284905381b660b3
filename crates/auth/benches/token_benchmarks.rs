//! Token issue/validate throughput.
//!
//! Run with: `cargo bench -p storefront-auth`

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use storefront_auth::{Hs256TokenCodec, Role, TokenIssuer, TokenValidator, DEFAULT_TOKEN_TTL};
use storefront_core::AccountId;

fn bench_issue(c: &mut Criterion) {
    let codec = Hs256TokenCodec::new("bench-secret", DEFAULT_TOKEN_TTL);
    let subject = AccountId::new();

    c.bench_function("token_issue", |b| {
        b.iter(|| codec.issue(black_box(subject), Role::Staff, Utc::now()))
    });
}

fn bench_validate(c: &mut Criterion) {
    let codec = Hs256TokenCodec::new("bench-secret", DEFAULT_TOKEN_TTL);
    let now = Utc::now();
    let issued = match codec.issue(AccountId::new(), Role::Staff, now) {
        Ok(issued) => issued,
        Err(e) => panic!("failed to issue bench token: {e}"),
    };

    c.bench_function("token_validate", |b| {
        b.iter(|| codec.validate(black_box(&issued.token), now))
    });
}

criterion_group!(benches, bench_issue, bench_validate);
criterion_main!(benches);
