use super::*;
use crate::rules::{build, query, queryf, rule};
use crate::term::{Tag, Term};
use crate::test_utils::{add, as_num, fold_rule, mul, num, rename_x_to_y, sub, var};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn incr_num() -> Strategy {
    rule(|t| as_num(t).map(|n| num(n + 1)))
}

fn decr_positive() -> Strategy {
    rule(|t| {
        let n = as_num(t)?;
        if n > 0 {
            Some(num(n - 1))
        } else {
            None
        }
    })
}

fn is_num() -> Strategy {
    where_s(rule(|t| as_num(t).map(|_| t.clone())))
}

fn counting(counter: &Arc<AtomicUsize>) -> Strategy {
    let counter = Arc::clone(counter);
    queryf(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

// ========== END-TO-END SCENARIO TESTS ==========

#[test]
fn innermost_folds_constants_to_normal_form() {
    let input = add(mul(num(2), num(3)), sub(num(10), num(4)));
    assert_eq!(innermost(fold_rule()).apply(&input), Some(num(12)));
}

#[test]
fn everywheretd_renames_variables() {
    let input = add(var("x"), mul(var("x"), var("z")));
    let expected = add(var("y"), mul(var("y"), var("z")));
    assert_eq!(everywheretd(rename_x_to_y()).apply(&input), Some(expected));
}

#[test]
fn oncetd_rewrites_only_the_first_match() {
    let input = add(num(1), num(2));
    assert_eq!(
        oncetd(incr_num()).apply(&input),
        Some(add(num(2), num(2))),
        "Only the leftmost topmost Num is incremented"
    );
}

// ========== NORMALIZATION TESTS ==========

#[test]
fn innermost_is_idempotent() {
    let input = add(mul(num(2), num(3)), sub(num(10), num(4)));
    let once = innermost(fold_rule()).apply(&input).expect("normalizes");
    let twice = innermost(fold_rule()).apply(&once).expect("still succeeds");
    assert_eq!(once, twice, "A normal form must be a fixed point");
}

#[test]
fn innermost2_reaches_the_same_normal_form() {
    let input = add(mul(num(2), num(3)), sub(num(10), num(4)));
    assert_eq!(innermost2(fold_rule()).apply(&input), Some(num(12)));
}

#[test]
fn outermost_reaches_the_same_normal_form() {
    let input = add(mul(num(2), num(3)), sub(num(10), num(4)));
    assert_eq!(outermost(fold_rule()).apply(&input), Some(num(12)));
}

#[test]
fn reduce_reaches_the_same_normal_form() {
    let input = add(mul(num(2), num(3)), sub(num(10), num(4)));
    assert_eq!(reduce(fold_rule()).apply(&input), Some(num(12)));
}

// ========== TRAVERSAL SCHEDULE TESTS ==========

#[test]
fn topdown_fails_when_the_strategy_fails_anywhere() {
    let input = add(num(1), num(2));
    assert_eq!(topdown(incr_num()).apply(&input), None, "The Add root does not match");
}

#[test]
fn bottomup_visits_children_before_the_parent() {
    // Children fold to Num first, making the root a redex on the way up.
    let input = add(add(num(1), num(2)), num(3));
    assert_eq!(bottomup(attempt(fold_rule())).apply(&input), Some(num(6)));
}

#[test]
fn downup_applies_on_both_passes() {
    let counter = Arc::new(AtomicUsize::new(0));
    let input = add(num(1), num(2));
    downup(counting(&counter)).apply(&input).expect("queries always succeed");
    // Nodes: Add, Num, Int, Num, Int; each visited twice.
    assert_eq!(counter.load(Ordering::SeqCst), 10);
}

#[test]
fn downup2_uses_each_strategy_once_per_node() {
    let down = Arc::new(AtomicUsize::new(0));
    let up = Arc::new(AtomicUsize::new(0));
    let input = add(num(1), num(2));
    downup2(counting(&down), counting(&up))
        .apply(&input)
        .expect("queries always succeed");
    assert_eq!(down.load(Ordering::SeqCst), 5);
    assert_eq!(up.load(Ordering::SeqCst), 5);
}

#[test]
fn alltd_does_not_descend_past_a_success() {
    // Replace whole sums; inner sums disappear with their parents.
    let swallow_add = rule(|t| {
        let p = t.as_product()?;
        if p.tag == Tag::new("Add") {
            Some(num(0))
        } else {
            None
        }
    });
    let input = mul(add(num(1), add(num(2), num(3))), num(4));
    assert_eq!(
        alltd(swallow_add).apply(&input),
        Some(mul(num(0), num(4))),
        "The outer Add is replaced before the inner one is ever visited"
    );
}

#[test]
fn allbu_prefers_the_descent_branch() {
    // The descent succeeds on every ordinary term (it bottoms out at
    // leaves), so the node-level fallback fires only where a child fails.
    let input = add(num(1), num(2));
    let out = allbu(incr_num()).apply(&input).expect("the descent branch succeeds");
    assert!(out.same(&input));
    assert!(allbu(fail()).apply(&num(1)).is_some());
}

#[test]
fn sometd_rewrites_at_least_one_match_per_committed_path() {
    let input = add(var("q"), num(2));
    assert_eq!(sometd(incr_num()).apply(&input), Some(add(var("q"), num(3))));
}

#[test]
fn somebu_fails_without_any_match() {
    let input = add(var("q"), var("r"));
    assert_eq!(somebu(incr_num()).apply(&input), None);
}

#[test]
fn manytd_requires_at_least_one_application() {
    let redex = add(num(1), var("q"));
    assert_eq!(manytd(incr_num()).apply(&redex), Some(add(num(2), var("q"))));
    let no_redex = add(var("p"), var("q"));
    assert_eq!(manytd(incr_num()).apply(&no_redex), None);
}

#[test]
fn manybu_requires_at_least_one_application() {
    let redex = add(num(1), num(2));
    assert_eq!(manybu(incr_num()).apply(&redex), Some(add(num(2), num(3))));
    assert_eq!(manybu(incr_num()).apply(&var("p")), None);
}

#[test]
fn somedownup_applies_before_and_after_the_descent() {
    let input = add(num(1), num(2));
    // Each Num matches on the way down and again on the way up.
    assert_eq!(somedownup(incr_num()).apply(&input), Some(add(num(3), num(4))));
}

#[test]
fn breadthfirst_visits_levels_below_the_subject() {
    let input = add(var("x"), mul(var("x"), num(1)));
    let out = breadthfirst(attempt(rename_x_to_y())).apply(&input).expect("attempt never fails");
    assert_eq!(out, add(var("y"), mul(var("y"), num(1))));
}

#[test]
fn leaves_rewrites_only_nodes_passing_the_leaf_test() {
    let input = add(num(1), mul(num(2), var("v")));
    let out = leaves(incr_num(), is_num()).apply(&input);
    assert_eq!(out, Some(add(num(2), mul(num(3), var("v")))));
}

#[test]
fn alltdfold_folds_on_the_way_up_where_the_finder_missed() {
    // Finder keeps Nums; the fold strategy then folds rebuilt operators.
    let keep_num = rule(|t| as_num(t).map(|_| t.clone()));
    let input = add(num(1), num(2));
    assert_eq!(
        alltdfold(keep_num, fold_rule()).apply(&input),
        Some(num(3))
    );
}

#[test]
fn alldownup2_applies_the_second_strategy_everywhere_up() {
    let input = add(add(num(1), num(2)), num(3));
    assert_eq!(
        alldownup2(rule(|t| as_num(t).map(|_| t.clone())), attempt(fold_rule())).apply(&input),
        Some(num(6))
    );
}

// ========== STOP-CONDITIONED TRAVERSAL TESTS ==========

#[test]
fn topdown_s_stop_prevents_descent() {
    // Stop below Mul nodes: variables under a product stay untouched.
    let is_mul = rule(|t| {
        let p = t.as_product()?;
        if p.tag == Tag::new("Mul") {
            Some(t.clone())
        } else {
            None
        }
    });
    let input = add(var("x"), mul(var("x"), var("z")));
    let out = topdown_s(attempt(rename_x_to_y()), move |_rec| where_s(is_mul.clone()))
        .apply(&input)
        .expect("attempt never fails");
    assert_eq!(
        out,
        add(var("y"), mul(var("x"), var("z"))),
        "The stop condition fires at Mul, so its subtree keeps the old names"
    );
}

#[test]
fn bottomup_s_reaches_the_subject_when_stop_never_fires() {
    let input = add(num(1), num(2));
    let out = bottomup_s(attempt(fold_rule()), |_rec| fail()).apply(&input);
    assert_eq!(out, Some(num(3)));
}

#[test]
fn downup_s_behaves_like_downup_when_stop_never_fires() {
    let counter = Arc::new(AtomicUsize::new(0));
    let input = add(num(1), num(2));
    downup_s(counting(&counter), |_rec| fail())
        .apply(&input)
        .expect("queries always succeed");
    assert_eq!(counter.load(Ordering::SeqCst), 10);
}

// ========== CONTROL COMBINATOR TESTS ==========

#[test]
fn attempt_turns_failure_into_identity() {
    let t = var("q");
    let out = attempt(fold_rule()).apply(&t).expect("attempt never fails");
    assert!(out.same(&t));
    assert_eq!(attempt(fail()).apply(&t).unwrap(), t);
}

#[test]
fn repeat_drives_to_a_fixed_point() {
    assert_eq!(repeat(decr_positive()).apply(&num(4)), Some(num(0)));
    let t = num(0);
    let out = repeat(decr_positive()).apply(&t).expect("repeat never fails");
    assert!(out.same(&t), "Zero applications leave the subject untouched");
}

#[test]
fn repeat_n_unrolls_exactly_n_steps() {
    assert_eq!(repeat_n(decr_positive(), 3).apply(&num(5)), Some(num(2)));
    assert_eq!(
        repeat_n(decr_positive(), 3).apply(&num(2)),
        None,
        "Running out of redexes before n steps is a failure"
    );
    let t = num(7);
    assert!(repeat_n(decr_positive(), 0).apply(&t).unwrap().same(&t));
}

#[test]
fn repeat1_requires_the_first_step() {
    assert_eq!(repeat1(decr_positive()).apply(&num(2)), Some(num(0)));
    assert_eq!(repeat1(decr_positive()).apply(&num(0)), None);
}

#[test]
fn repeatuntil_stops_once_the_test_holds() {
    let is_zero = rule(|t| if as_num(t)? == 0 { Some(t.clone()) } else { None });
    assert_eq!(repeatuntil(decr_positive(), is_zero).apply(&num(3)), Some(num(0)));
}

#[test]
fn loop_s_runs_while_the_condition_holds() {
    let positive = rule(|t| if as_num(t)? > 0 { Some(t.clone()) } else { None });
    assert_eq!(loop_s(positive, decr_positive()).apply(&num(3)), Some(num(0)));
    let t = var("q");
    assert!(loop_s(fail(), decr_positive()).apply(&t).unwrap().same(&t));
}

#[test]
fn doloop_applies_the_body_first() {
    let positive = rule(|t| if as_num(t)? > 0 { Some(t.clone()) } else { None });
    assert_eq!(doloop(decr_positive(), positive).apply(&num(1)), Some(num(0)));
    assert_eq!(
        doloop(decr_positive(), fail()).apply(&num(5)),
        Some(num(4)),
        "The body runs once even when the condition never holds"
    );
}

#[test]
fn loopnot_runs_until_the_test_succeeds() {
    let is_zero = rule(|t| if as_num(t)? == 0 { Some(t.clone()) } else { None });
    assert_eq!(loopnot(is_zero, decr_positive()).apply(&num(2)), Some(num(0)));
}

#[test]
fn loopiter_sequences_the_indexed_strategies() {
    let trail: Arc<parking_lot::Mutex<Vec<i64>>> = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let trail_in = Arc::clone(&trail);
    let s = loopiter(
        move |i| {
            let trail = Arc::clone(&trail_in);
            queryf(move |_| trail.lock().push(i))
        },
        1,
        3,
    );
    s.apply(&num(0)).expect("queries always succeed");
    assert_eq!(*trail.lock(), vec![1, 2, 3], "Indices run low to high");
    let t = num(0);
    assert!(loopiter(|_| fail(), 3, 1).apply(&t).unwrap().same(&t), "Empty range is the identity");
}

#[test]
fn where_s_tests_without_transforming() {
    let t = add(num(1), num(2));
    let out = where_s(fold_rule()).apply(&t).expect("the fold succeeds");
    assert!(out.same(&t), "where discards the transformation");
    assert_eq!(where_s(fold_rule()).apply(&var("q")), None);
    assert_eq!(test(fold_rule()).apply(&t).unwrap(), t);
}

#[test]
fn not_inverts_success() {
    let t = add(num(1), num(2));
    assert_eq!(not(fold_rule()).apply(&t), None, "not fails where the argument succeeds");
    let q = var("q");
    let out = not(fold_rule()).apply(&q).expect("not succeeds where the argument fails");
    assert!(out.same(&q));
}

#[test]
fn and_requires_both_tests() {
    let t = add(num(1), num(2));
    let is_add = rule(|t| {
        let p = t.as_product()?;
        if p.tag == Tag::new("Add") {
            Some(t.clone())
        } else {
            None
        }
    });
    assert!(and(is_add.clone(), fold_rule()).apply(&t).unwrap().same(&t));
    assert_eq!(and(is_add.clone(), fail()).apply(&t), None);
    assert_eq!(and(fail(), is_add).apply(&t), None);
}

#[test]
fn or_succeeds_when_either_test_does() {
    let t = add(num(1), num(2));
    assert!(or(fold_rule(), fail()).apply(&t).unwrap().same(&t));
    assert!(or(fail(), fold_rule()).apply(&t).unwrap().same(&t));
    assert_eq!(or(fail(), fail()).apply(&t), None);
}

#[test]
fn or_always_runs_both_sides() {
    let hits = Arc::new(AtomicUsize::new(0));
    let t = num(1);
    or(id(), counting(&hits)).apply(&t).expect("or succeeds");
    assert_eq!(hits.load(Ordering::SeqCst), 1, "The second test runs even after the first succeeds");
}

#[test]
fn ior_keeps_a_transformation() {
    let t = add(num(1), num(2));
    assert_eq!(ior(fold_rule(), fail()).apply(&t), Some(num(3)));
    assert_eq!(ior(fail(), fold_rule()).apply(&t), Some(num(3)));
    assert_eq!(
        ior(build(num(0)), fold_rule()).apply(&t),
        Some(num(3)),
        "When both succeed the second result wins"
    );
    assert_eq!(ior(fail(), fail()).apply(&t), None);
}

#[test]
fn restore_runs_the_restorer_only_on_failure() {
    let restored = Arc::new(AtomicUsize::new(0));
    let t = add(num(1), num(2));
    assert_eq!(restore(fold_rule(), counting(&restored)).apply(&t), Some(num(3)));
    assert_eq!(restored.load(Ordering::SeqCst), 0);
    assert_eq!(restore(fail(), counting(&restored)).apply(&t), None);
    assert_eq!(restored.load(Ordering::SeqCst), 1, "Failure triggers the restorer and still fails");
}

#[test]
fn restorealways_runs_the_restorer_on_both_paths() {
    let restored = Arc::new(AtomicUsize::new(0));
    let t = add(num(1), num(2));
    assert_eq!(
        restorealways(fold_rule(), counting(&restored)).apply(&t),
        Some(num(3))
    );
    assert_eq!(restorealways(fail(), counting(&restored)).apply(&t), None);
    assert_eq!(restored.load(Ordering::SeqCst), 2);
}

#[test]
fn lastly_runs_the_finalizer_and_keeps_the_result() {
    let finalized = Arc::new(AtomicUsize::new(0));
    let t = add(num(1), num(2));
    assert_eq!(
        lastly(fold_rule(), counting(&finalized)).apply(&t),
        Some(num(3)),
        "The finalizer must not replace the strategy's result"
    );
    assert_eq!(lastly(fail(), counting(&finalized)).apply(&t), None);
    assert_eq!(finalized.load(Ordering::SeqCst), 2);
}

// ========== SEQUENCE LIFTING TESTS ==========

#[test]
fn map_s_rewrites_element_wise() {
    let t = Term::seq([num(1), num(2)]);
    assert_eq!(map_s(incr_num()).apply(&t), Some(Term::seq([num(2), num(3)])));
}

#[test]
fn map_s_fails_on_non_sequences_and_element_failures() {
    assert_eq!(map_s(incr_num()).apply(&add(num(1), num(2))), None);
    assert_eq!(map_s(incr_num()).apply(&Term::seq([num(1), var("q")])), None);
}

#[test]
fn map_s_returns_the_subject_when_unchanged() {
    let t = Term::seq([num(1), num(2)]);
    let out = map_s(id()).apply(&t).expect("id succeeds element-wise");
    assert!(out.same(&t));
}

// ========== EVERYWHERE TESTS ==========

#[test]
fn everywherebu_matches_everywheretd_on_non_overlapping_rules() {
    let input = add(var("x"), mul(var("x"), var("z")));
    let td = everywheretd(rename_x_to_y()).apply(&input);
    let bu = everywherebu(rename_x_to_y()).apply(&input);
    assert_eq!(td, bu);
    assert_eq!(everywhere(rename_x_to_y()).apply(&input), td);
}

#[test]
fn everywheretd_survives_side_effect_queries() {
    let seen = Arc::new(AtomicUsize::new(0));
    let seen_in = Arc::clone(&seen);
    let input = add(num(1), num(2));
    everywheretd(query(move |t| {
        as_num(t)?;
        seen_in.fetch_add(1, Ordering::SeqCst);
        Some(())
    }))
    .apply(&input)
    .expect("attempted queries never fail");
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}
