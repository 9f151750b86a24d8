// Copyright (c) 2025 Aegis Team
// SPDX-License-Identifier: Apache-2.0

//! Partitioning of workflow steps into execution batches.

use crate::config::StepDef;

/// A contiguous batch of step indices.
///
/// Parallel batches hold every consecutive step declared `parallel`;
/// sequential batches hold exactly one step. Batches execute in order;
/// a non-parallel step flushes any open parallel run first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepBatch {
    Sequential(usize),
    Parallel(Vec<usize>),
}

impl StepBatch {
    /// Indices of this batch, in declaration order.
    pub fn indices(&self) -> Vec<usize> {
        match self {
            StepBatch::Sequential(index) => vec![*index],
            StepBatch::Parallel(indices) => indices.clone(),
        }
    }
}

/// Partition steps into contiguous parallel and sequential batches.
pub fn plan_batches(steps: &[StepDef]) -> Vec<StepBatch> {
    let mut batches = Vec::new();
    let mut open_parallel: Vec<usize> = Vec::new();

    for (index, step) in steps.iter().enumerate() {
        if step.parallel {
            open_parallel.push(index);
        } else {
            if !open_parallel.is_empty() {
                batches.push(StepBatch::Parallel(std::mem::take(&mut open_parallel)));
            }
            batches.push(StepBatch::Sequential(index));
        }
    }
    if !open_parallel.is_empty() {
        batches.push(StepBatch::Parallel(open_parallel));
    }
    batches
}
