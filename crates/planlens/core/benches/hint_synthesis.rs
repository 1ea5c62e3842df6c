// PlanLens
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Benchmarks for hint synthesis and what-if rewriting over large plans.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use planlens_core::PlanNode;
use planlens_core::hints::{annotate_query, synthesize_strings};
use planlens_core::whatif::{WhatIfScenario, generate_questions, rewrite};

/// Left-deep join tree over `tables` relations, alternating join strategies.
fn left_deep_plan(tables: usize) -> PlanNode {
    let mut plan = PlanNode::new("Seq Scan").with_relation("t0");
    for i in 1..tables {
        let scan = if i % 2 == 0 {
            PlanNode::new("Index Scan").with_relation(format!("t{i}"))
        } else {
            PlanNode::new("Seq Scan").with_relation(format!("t{i}"))
        };
        let cond = format!("(t{}.id = t{i}.id)", i - 1);
        plan = match i % 3 {
            0 => PlanNode::new("Hash Join")
                .with_hash_cond(cond)
                .with_child(plan)
                .with_child(PlanNode::new("Hash").with_child(scan)),
            1 => PlanNode::new("Merge Join").with_merge_cond(cond).with_child(plan).with_child(scan),
            _ => PlanNode::new("Nested Loop")
                .with_output([format!("t{}.id", i - 1), format!("t{i}.id")])
                .with_child(plan)
                .with_child(scan),
        };
    }
    plan
}

fn bench_synthesis(c: &mut Criterion) {
    let mut group = c.benchmark_group("hint_synthesis");
    for tables in [4usize, 16, 64, 256] {
        let plan = left_deep_plan(tables);
        group.throughput(Throughput::Elements(plan.node_count() as u64));
        group.bench_with_input(BenchmarkId::new("synthesize", tables), &plan, |b, plan| {
            b.iter(|| synthesize_strings(black_box(plan)));
        });
    }
    group.finish();
}

fn bench_questions_and_rewrite(c: &mut Criterion) {
    let mut group = c.benchmark_group("whatif");
    for tables in [4usize, 16, 64] {
        let plan = left_deep_plan(tables);
        let hints = synthesize_strings(&plan);
        let query = annotate_query("SELECT * FROM t0", &hints);
        let questions = generate_questions(&hints);
        let scenarios: Vec<WhatIfScenario> = questions.specific.iter().cloned().map(WhatIfScenario::from_question).collect();

        group.bench_with_input(BenchmarkId::new("questions", tables), &hints, |b, hints| {
            b.iter(|| generate_questions(black_box(hints)));
        });
        group.bench_with_input(BenchmarkId::new("rewrite_by_name", tables), &scenarios, |b, scenarios| {
            b.iter(|| rewrite(black_box(&query), black_box(scenarios)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_synthesis, bench_questions_and_rewrite);
criterion_main!(benches);
