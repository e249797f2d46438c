use mcq_sleuth::evaluator::StepEffect;
use mcq_sleuth::rules::Outcome;
use mcq_sleuth::{
    evaluate_corpus, predict, AnswerOption, CalibratedConfig, Confidence, Evaluator, Question,
    Rule, RuleLibrary,
};

fn question(id: u32, text: &str, options: &[(&str, bool)]) -> Question {
    Question::new(
        id,
        text,
        options
            .iter()
            .map(|(t, c)| AnswerOption::new(*t, *c))
            .collect(),
    )
    .unwrap()
}

fn evaluator() -> Evaluator {
    Evaluator::new(RuleLibrary::new(CalibratedConfig::default()).unwrap())
}

fn sample_corpus() -> Vec<Question> {
    vec![
        question(
            1,
            "Paging avoids external fragmentation.",
            &[("True", true), ("does not support X", false)],
        ),
        question(
            2,
            "Which of these are process states?",
            &[
                ("Option A", false),
                ("Option B", false),
                ("Option C", false),
                ("All of the mentioned", true),
            ],
        ),
        question(
            3,
            "How does the kernel extend physical storage?",
            &[
                ("None of the above", false),
                ("Uses paging", true),
                ("Uses swapping", false),
                ("Uses segmentation", false),
            ],
        ),
        question(
            4,
            "Which condition is necessary for a deadlock?",
            &[
                ("Mutual exclusion of shared resources held by tasks", false),
                ("Circular wait", true),
                ("Preemption of resources by the kernel", false),
                ("Hold and release", false),
            ],
        ),
        question(
            5,
            "Which of the following is not a valid state of a thread?",
            &[
                ("Running", true),
                ("Blocked on input", false),
                ("Terminated by parent signal", false),
                ("Waiting for the kernel", false),
            ],
        ),
        question(
            6,
            "What improves throughput?",
            &[
                ("None of these", false),
                ("Batching many small requests together", true),
                ("Polling", false),
                ("Sleeping", false),
            ],
        ),
    ]
}

#[test]
fn negated_true_false_option_loses() {
    let q = question(
        1,
        "Paging avoids external fragmentation.",
        &[("True", true), ("does not support X", false)],
    );
    let p = evaluator().evaluate(&q);
    assert_eq!(p.predicted_option_index, 0);
    assert_eq!(p.confidence, Confidence::Certain);
    assert_eq!(p.rule_id, Rule::BinarySentiment);
}

#[test]
fn negated_option_loses_in_either_position() {
    let q = question(
        2,
        "Threads share an address space.",
        &[("A thread cannot share memory", false), ("False", true)],
    );
    let p = evaluator().evaluate(&q);
    assert_eq!(p.predicted_option_index, 1);
    assert_eq!(p.rule_id, Rule::BinarySentiment);
}

#[test]
fn all_of_the_mentioned_is_picked() {
    let q = question(
        2,
        "Which of these are process states?",
        &[
            ("Option A", false),
            ("Option B", false),
            ("Option C", false),
            ("d) All of the mentioned", true),
        ],
    );
    let e = evaluator();
    let first = e.evaluate(&q);
    assert_eq!(first.predicted_option_index, 3);
    assert_eq!(first.confidence, Confidence::Certain);
    assert_eq!(first.rule_id, Rule::UniversalQuantifier);
    assert_eq!(e.evaluate(&q), first);
}

#[test]
fn none_of_the_above_is_removed_first() {
    let q = question(
        3,
        "How does the kernel extend physical storage?",
        &[
            ("None of the above", false),
            ("Uses paging", true),
            ("Uses swapping", false),
            ("Uses segmentation", false),
        ],
    );
    let explanation = evaluator().explain(&q);
    assert_ne!(explanation.prediction.predicted_option_index, 0);

    let first_elimination = explanation
        .steps
        .iter()
        .find(|s| matches!(s.effect, StepEffect::Eliminated { .. }))
        .unwrap();
    assert_eq!(first_elimination.rule, Rule::EliminateNone);
    assert_eq!(
        first_elimination.effect,
        StepEffect::Eliminated { removed: vec![0] }
    );
}

#[test]
fn unique_tier_one_keyword_beats_length() {
    let q = question(
        4,
        "Which condition is necessary for a deadlock?",
        &[
            ("Mutual exclusion of shared resources held by tasks", false),
            ("Circular wait", true),
            ("Preemption of resources by the kernel", false),
            ("Hold and release", false),
        ],
    );
    let p = evaluator().evaluate(&q);
    assert_eq!(p.predicted_option_index, 1);
    assert_eq!(p.confidence, Confidence::Certain);
    assert_eq!(p.rule_id, Rule::KeywordTiers);
    assert_eq!(p.trigger.as_deref(), Some("circular"));
}

#[test]
fn not_question_picks_fewest_words() {
    let q = question(
        5,
        "Which of the following is not a valid state of a thread?",
        &[
            ("Blocked on input", false),
            ("Running", true),
            ("Terminated by parent signal", false),
            ("Waiting for the kernel", false),
        ],
    );
    let p = evaluator().evaluate(&q);
    assert_eq!(p.predicted_option_index, 1);
    assert_eq!(p.confidence, Confidence::Probable);
    assert_eq!(p.rule_id, Rule::NegativeQuestion);
}

#[test]
fn not_question_still_honours_tier_one() {
    let q = question(
        6,
        "Which of the following is NOT a deadlock condition?",
        &[
            ("Mutual exclusion", false),
            ("No preemption", false),
            ("Circular wait on resources held", true),
            ("Starvation", false),
        ],
    );
    let p = evaluator().evaluate(&q);
    assert_eq!(p.predicted_option_index, 2);
    assert_eq!(p.confidence, Confidence::Certain);
    assert_eq!(p.rule_id, Rule::NegativeQuestion);
}

#[test]
fn not_question_skips_positive_rules() {
    let q = question(
        7,
        "Which is not done by the loader?",
        &[
            ("Relocation of code (at load time)", false),
            ("Linking", true),
            ("Allocation of space for the program image", false),
        ],
    );
    let mut config = CalibratedConfig::default();
    config.rule_priority_order = Rule::ALL
        .iter()
        .copied()
        .filter(|r| !matches!(r, Rule::NegativeQuestion | Rule::FirstLongest))
        .chain([Rule::NegativeQuestion, Rule::FirstLongest])
        .collect();
    let evaluator = Evaluator::new(RuleLibrary::new(config).unwrap());

    let explanation = evaluator.explain(&q);
    let skipped: Vec<Rule> = explanation
        .steps
        .iter()
        .filter(|s| s.effect == StepEffect::Skipped)
        .map(|s| s.rule)
        .collect();
    assert!(skipped.contains(&Rule::KeywordTiers));
    assert!(skipped.contains(&Rule::Parenthetical));
    assert!(skipped.contains(&Rule::LongestOption));
    assert_eq!(explanation.prediction.rule_id, Rule::NegativeQuestion);
    assert_eq!(explanation.prediction.predicted_option_index, 1);
}

#[test]
fn trap_words_leave_a_sole_survivor() {
    let q = question(
        8,
        "What is a bitmap used for?",
        &[
            ("None of the above", false),
            ("Prevents deadlocks", false),
            ("Reduces speed", false),
            ("Tracking free blocks", true),
        ],
    );
    let p = evaluator().evaluate(&q);
    assert_eq!(p.predicted_option_index, 3);
    assert_eq!(p.confidence, Confidence::Certain);
    assert_eq!(p.rule_id, Rule::SoleSurvivor);
}

#[test]
fn trap_word_in_question_text_is_not_a_trap() {
    let q = question(
        9,
        "What does the memory manager track?",
        &[
            ("Free memory frames", true),
            ("Disk sectors", false),
            ("Network ports", false),
            ("User passwords", false),
        ],
    );
    let explanation = evaluator().explain(&q);
    let trap_step = explanation
        .steps
        .iter()
        .find(|s| s.rule == Rule::EliminateTrapWords)
        .unwrap();
    assert_eq!(trap_step.effect, StepEffect::NoOpinion);
    assert_eq!(explanation.prediction.predicted_option_index, 0);
    assert_eq!(explanation.prediction.rule_id, Rule::Echo);
}

#[test]
fn tier_keyword_saves_option_from_trap() {
    let q = question(
        10,
        "What does shared paging provide?",
        &[
            ("Allows memory to be shared between tasks", true),
            ("Single address space", false),
            ("Faster disks", false),
        ],
    );
    let p = evaluator().evaluate(&q);
    assert_eq!(p.predicted_option_index, 0);
}

#[test]
fn verb_prefix_option_is_removed() {
    let q = question(
        11,
        "What does a dispatcher do?",
        &[
            ("Schedules jobs by priority", false),
            ("Gives control of the cpu to the selected task", true),
            ("Formats disks", false),
        ],
    );
    let explanation = evaluator().explain(&q);
    assert!(explanation.steps.iter().any(|s| s.rule == Rule::EliminateVerbPrefix
        && s.effect == StepEffect::Eliminated { removed: vec![0] }));
    assert_eq!(explanation.prediction.predicted_option_index, 1);
}

#[test]
fn domain_term_removed_unless_question_is_about_it() {
    let off_topic = question(
        12,
        "Which structure tracks open files?",
        &[
            ("Round robin scheduling", false),
            ("Open file table", true),
            ("Page cache", false),
        ],
    );
    let explanation = evaluator().explain(&off_topic);
    assert!(explanation.steps.iter().any(|s| s.rule == Rule::EliminateDomainTerm
        && s.effect == StepEffect::Eliminated { removed: vec![0] }));
    assert_eq!(explanation.prediction.predicted_option_index, 1);

    let on_topic = question(
        13,
        "Which scheduling policy is fair?",
        &[
            ("Round robin scheduling", true),
            ("Open file table", false),
            ("Page cache", false),
        ],
    );
    let explanation = evaluator().explain(&on_topic);
    let step = explanation
        .steps
        .iter()
        .find(|s| s.rule == Rule::EliminateDomainTerm)
        .unwrap();
    assert_eq!(step.effect, StepEffect::NoOpinion);
}

#[test]
fn each_yields_to_share() {
    let vetoed = question(
        14,
        "How are resources distributed in a cluster?",
        &[
            ("Each node owns one disk", false),
            ("Nodes share a common bus", false),
            ("Everything runs locally", false),
            ("Nothing is distributed", true),
        ],
    );
    let p = evaluator().evaluate(&vetoed);
    assert_ne!(p.rule_id, Rule::KeywordTiers);
    assert_eq!(p.predicted_option_index, 3);
    assert_eq!(p.rule_id, Rule::Echo);

    let free = question(
        15,
        "How are resources laid out in a cluster?",
        &[
            ("Each node owns one disk", true),
            ("Nodes use a common bus", false),
            ("Everything runs locally", false),
        ],
    );
    let p = evaluator().evaluate(&free);
    assert_eq!(p.rule_id, Rule::KeywordTiers);
    assert_eq!(p.confidence, Confidence::Probable);
    assert_eq!(p.trigger.as_deref(), Some("each"));
}

#[test]
fn parenthetical_option_is_preferred() {
    let q = question(
        16,
        "Which describes a journaling design?",
        &[
            ("Logs changes (before committing them)", true),
            ("Keeps blocks", false),
            ("Uses tapes", false),
            ("Copies disks", false),
        ],
    );
    let p = evaluator().evaluate(&q);
    assert_eq!(p.predicted_option_index, 0);
    assert_eq!(p.rule_id, Rule::Parenthetical);
    assert_eq!(p.confidence, Confidence::Probable);
}

#[test]
fn golden_duplicate_picks_longer_holder() {
    let q = question(
        17,
        "What happens during a context switch?",
        &[
            ("The cpu halts", false),
            ("The cpu saves registers to the stack", true),
            ("Disk spins", false),
            ("Bus resets", false),
        ],
    );
    let p = evaluator().evaluate(&q);
    assert_eq!(p.predicted_option_index, 1);
    assert_eq!(p.rule_id, Rule::DuplicateKeyword);
    assert_eq!(p.trigger.as_deref(), Some("cpu"));
}

#[test]
fn longest_is_downgraded_after_none_removal() {
    let with_none = question(
        18,
        "What improves throughput?",
        &[
            ("None of these", false),
            ("Batching many small requests together", true),
            ("Polling", false),
            ("Sleeping", false),
        ],
    );
    let p = evaluator().evaluate(&with_none);
    assert_eq!(p.rule_id, Rule::LongestOption);
    assert_eq!(p.predicted_option_index, 1);
    assert_eq!(p.confidence, Confidence::Gamble);

    let without_none = question(
        19,
        "What improves throughput?",
        &[
            ("Spinning", false),
            ("Batching many small requests together", true),
            ("Polling", false),
            ("Sleeping", false),
        ],
    );
    let p = evaluator().evaluate(&without_none);
    assert_eq!(p.rule_id, Rule::LongestOption);
    assert_eq!(p.confidence, Confidence::Probable);
}

#[test]
fn ties_fall_through_to_first_longest() {
    let q = question(
        20,
        "Pick one.",
        &[("Alpha beta", false), ("Gamma delta", true), ("Epsilon", false)],
    );
    let p = evaluator().evaluate(&q);
    assert_eq!(p.rule_id, Rule::FirstLongest);
    assert_eq!(p.predicted_option_index, 0);
    assert_eq!(p.confidence, Confidence::Gamble);
}

#[test]
fn every_question_gets_exactly_one_valid_prediction() {
    let corpus = sample_corpus();
    let e = evaluator();
    for q in &corpus {
        let explanation = e.explain(q);
        let p = &explanation.prediction;
        assert_eq!(p.question_id, q.id());
        assert!(p.predicted_option_index < q.options().len());

        let picks = explanation
            .steps
            .iter()
            .filter(|s| matches!(s.effect, StepEffect::Picked { .. }))
            .count();
        assert_eq!(picks, 1, "question {} picked {picks} times", q.id());

        for step in &explanation.steps {
            if let StepEffect::Eliminated { removed } = &step.effect {
                assert!(!removed.is_empty());
                assert!(!removed.contains(&p.predicted_option_index));
            }
        }
    }
}

#[test]
fn corpus_evaluation_is_deterministic() {
    let corpus = sample_corpus();
    let first = evaluate_corpus(&corpus, CalibratedConfig::default()).unwrap();
    let second = evaluate_corpus(&corpus, CalibratedConfig::default()).unwrap();
    assert_eq!(first.predictions, second.predictions);
    assert_eq!(first.report.correct, second.report.correct);

    let sequential: Vec<_> = corpus.iter().map(|q| predict(q).unwrap()).collect();
    assert_eq!(first.predictions, sequential);
}

#[test]
fn sample_corpus_scores_fully() {
    let corpus = sample_corpus();
    let result = evaluate_corpus(&corpus, CalibratedConfig::default()).unwrap();
    assert_eq!(result.report.total, 6);
    assert_eq!(result.report.correct, 6, "wrong: {:?}", result.report.wrong_question_ids);
    assert_eq!(result.report.overall_accuracy, 1.0);
}

#[test]
fn report_json_has_summary_fields() {
    let corpus = sample_corpus();
    let result = evaluate_corpus(&corpus, CalibratedConfig::default()).unwrap();
    let json = serde_json::to_string_pretty(&result).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    let report = parsed.get("report").unwrap();
    assert!(report.get("overall_accuracy").is_some());
    assert!(report["by_confidence"].get("certain").is_some());
    assert!(report["by_rule"].get("universal-quantifier").is_some());
    assert_eq!(parsed["predictions"][0]["rule_id"], "binary-sentiment");
}

#[test]
fn elimination_that_would_remove_everything_is_skipped() {
    let q = question(
        21,
        "Which approach is best?",
        &[
            ("Prevents deadlocks", false),
            ("Reduces speed", true),
            ("Single memory", false),
        ],
    );
    let explanation = evaluator().explain(&q);
    let trap_step = explanation
        .steps
        .iter()
        .find(|s| s.rule == Rule::EliminateTrapWords)
        .unwrap();
    assert_eq!(trap_step.effect, StepEffect::NoOpinion);
    assert_eq!(explanation.prediction.rule_id, Rule::FirstLongest);
    assert_eq!(explanation.prediction.predicted_option_index, 0);
    assert_eq!(explanation.prediction.confidence, Confidence::Gamble);
}

#[test]
fn gamble_tier_keyword_is_the_last_resort() {
    let q = question(
        22,
        "Pick one.",
        &[("Alpha beta", false), ("Gamma data", true), ("Epsilon zeta", false)],
    );
    let p = evaluator().evaluate(&q);
    assert_eq!(p.rule_id, Rule::LastResortKeywords);
    assert_eq!(p.predicted_option_index, 1);
    assert_eq!(p.confidence, Confidence::Gamble);
    assert_eq!(p.trigger.as_deref(), Some("data"));
}

#[test]
fn pick_confidence_follows_the_deciding_rule() {
    let e = evaluator();
    for q in &sample_corpus() {
        let p = e.evaluate(q);
        match p.rule_id {
            // Tier-1 hits are promoted to certain.
            Rule::KeywordTiers | Rule::NegativeQuestion => {
                assert!(p.confidence <= p.rule_id.confidence(), "question {}", q.id())
            }
            // Downgraded once a none-style option was removed.
            Rule::LongestOption => {
                assert!(p.confidence >= p.rule_id.confidence(), "question {}", q.id())
            }
            rule => assert_eq!(p.confidence, rule.confidence(), "question {}", q.id()),
        }
    }
}

#[test]
fn none_removal_is_recorded_on_the_context() {
    let q = question(
        23,
        "What improves throughput?",
        &[
            ("None of these", false),
            ("Batching many small requests together", true),
            ("Polling", false),
        ],
    );
    let e = evaluator();
    let library = e.library();
    let mut ctx = library.context(&q);
    assert_eq!(ctx.question().id(), 23);
    assert!(!ctx.none_removed());

    let Outcome::Narrowed(survivors) = library.apply(Rule::EliminateNone, &ctx) else {
        panic!("expected the none-style option to be removed");
    };
    ctx.narrow(survivors, Rule::EliminateNone);
    assert!(ctx.none_removed());
    assert_eq!(ctx.live(), &[1, 2]);

    match library.apply(Rule::LongestOption, &ctx) {
        Outcome::Pick(pick) => {
            assert_eq!(pick.index, 1);
            assert_eq!(pick.confidence, Confidence::Gamble);
            assert!(pick.confidence > Rule::LongestOption.confidence());
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}
