//! Tests for parallel composition.

use std::collections::HashMap;

use crate::error::InitError;
use crate::input::iter_input;
use crate::output::BufferOutput;
use crate::runner::run;
use crate::tracts::{func_tract, parallel};
use crate::tract::Tract;

fn identity_siblings(count: usize) -> Vec<Box<dyn Tract<u32, u32>>> {
  (0..count)
    .map(|i| {
      Box::new(func_tract(format!("sibling-{i}"), 1, |x: u32| x)) as Box<dyn Tract<u32, u32>>
    })
    .collect()
}

#[tokio::test]
async fn each_request_is_taken_by_exactly_one_sibling() {
  let results = BufferOutput::new();
  run(iter_input(1u32..=100), parallel("spread", identity_siblings(3)), results.clone())
    .await
    .expect("init");

  let mut out = results.take();
  assert_eq!(out.len(), 100);
  out.sort_unstable();
  assert_eq!(out, (1u32..=100).collect::<Vec<_>>());
}

#[tokio::test]
async fn output_bag_matches_a_single_tract() {
  let bag = |values: Vec<u32>| {
    let mut counts: HashMap<u32, usize> = HashMap::new();
    for v in values {
      *counts.entry(v).or_default() += 1;
    }
    counts
  };

  let single = BufferOutput::new();
  run(iter_input(1u32..=40), func_tract("id", 1, |x: u32| x), single.clone())
    .await
    .expect("init");

  let tripled = BufferOutput::new();
  run(iter_input(1u32..=40), parallel("three", identity_siblings(3)), tripled.clone())
    .await
    .expect("init");

  assert_eq!(bag(single.take()), bag(tripled.take()));
}

#[tokio::test]
async fn sibling_init_failure_names_the_branch() {
  let mut siblings = identity_siblings(2);
  siblings.insert(1, Box::new(func_tract("broken", 0, |x: u32| x)));

  let results: BufferOutput<u32> = BufferOutput::new();
  let err = run(iter_input(vec![1u32]), parallel("spread", siblings), results.clone())
    .await
    .expect_err("branch must fail init");

  match err {
    InitError::Branch { index, ref name, .. } => {
      assert_eq!(index, 1);
      assert_eq!(name, "broken");
    }
    ref other => panic!("unexpected error: {other}"),
  }
}
