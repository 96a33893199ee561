// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Benchmarks for the ledger and catalogs.
//!
//! Run with: cargo bench
//!
//! Benchmarks include:
//! - Applying earn and spend transactions
//! - Searching and sorting a catalog
//! - Backup serialization and validation

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use hopeless_coin::{
    Catalog, CatalogKind, Ledger, MemoryStore, Session, Snapshot, SortDirection, SortKey,
    TransactionKind,
};
use rust_decimal::Decimal;

// =============================================================================
// Helper Functions
// =============================================================================

fn filled_catalog(size: usize) -> Catalog {
    let mut catalog = Catalog::new(CatalogKind::Spend);
    for i in 0..size {
        let amount = Decimal::new(((i * 7919) % 10_000 + 1) as i64, 2);
        catalog.add(&format!("Reward {i}"), amount).unwrap();
    }
    catalog
}

fn filled_session(transactions: usize) -> Session<MemoryStore> {
    let mut session = Session::open(MemoryStore::new()).unwrap();
    for i in 0..transactions {
        let kind = if i % 3 == 2 {
            TransactionKind::Spend
        } else {
            TransactionKind::Earn
        };
        session
            .apply_transaction("entry", Decimal::new(150, 2), kind)
            .unwrap();
    }
    session
}

// =============================================================================
// Ledger Benchmarks
// =============================================================================

fn bench_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_apply");

    for count in [100, 1_000, 10_000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut ledger = Ledger::new();
                for i in 0..count {
                    let kind = if i % 2 == 0 {
                        TransactionKind::Earn
                    } else {
                        TransactionKind::Spend
                    };
                    let _ = ledger.apply("entry", Decimal::new(100, 2), kind);
                }
                black_box(ledger.balance())
            });
        });
    }

    group.finish();
}

// =============================================================================
// Catalog Benchmarks
// =============================================================================

fn bench_catalog(c: &mut Criterion) {
    let mut group = c.benchmark_group("catalog");

    for size in [100, 1_000] {
        let catalog = filled_catalog(size);
        group.bench_with_input(BenchmarkId::new("search", size), &catalog, |b, catalog| {
            b.iter(|| black_box(catalog.search("reward 1").count()));
        });
        group.bench_with_input(BenchmarkId::new("sort", size), &catalog, |b, catalog| {
            b.iter(|| {
                black_box(catalog.sort_by(SortKey::Description, SortDirection::Descending).len())
            });
        });
    }

    group.finish();
}

// =============================================================================
// Backup Benchmarks
// =============================================================================

fn bench_backup(c: &mut Criterion) {
    let mut group = c.benchmark_group("backup");

    for transactions in [100, 1_000] {
        let session = filled_session(transactions);
        let text = session.backup_json().unwrap();

        group.bench_with_input(
            BenchmarkId::new("export", transactions),
            &session,
            |b, session| b.iter(|| black_box(session.backup_json().unwrap())),
        );
        group.bench_with_input(BenchmarkId::new("validate", transactions), &text, |b, text| {
            b.iter(|| black_box(Snapshot::from_backup_json(text).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_apply, bench_catalog, bench_backup);
criterion_main!(benches);
