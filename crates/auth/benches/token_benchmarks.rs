use criterion::{black_box, criterion_group, criterion_main, Criterion};

use portal_auth::{Claims, Permission, TokenConfig, TokenService};
use portal_core::{RoleId, UserId};

fn service() -> TokenService {
    let config = TokenConfig::new("bench-access", "bench-refresh", "portal-api", "portal-web")
        .expect("valid bench config");
    TokenService::new(config)
}

fn claims(permission_count: usize) -> Claims {
    Claims::new(
        UserId::new(1),
        "bench@example.com",
        RoleId::new(2),
        (0..permission_count).map(|i| Permission::new(format!("listing.p{i}"))),
    )
}

fn bench_issue(c: &mut Criterion) {
    let svc = service();
    let mut group = c.benchmark_group("issue");
    for count in [1usize, 16, 64] {
        let claims = claims(count);
        group.bench_function(format!("pair/{count}_permissions"), |b| {
            b.iter(|| svc.issue_pair(black_box(&claims)))
        });
    }
    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let svc = service();
    let mut group = c.benchmark_group("validate");
    for count in [1usize, 16, 64] {
        let token = svc.issue_refresh(&claims(count)).expect("issue");
        group.bench_function(format!("refresh/{count}_permissions"), |b| {
            b.iter(|| svc.validate_refresh(black_box(&token)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_issue, bench_validate);
criterion_main!(benches);
