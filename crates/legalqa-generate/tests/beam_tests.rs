use legalqa_core::config::GenerationSettings;
use legalqa_generate::{beam_search, BeamSearchConfig, StepScorer};

const EOS: u32 = 0;
const A: u32 = 1;
const B: u32 = 2;
const START: u32 = 3;

fn config(num_beams: usize, min_length: usize, max_length: usize) -> BeamSearchConfig {
    BeamSearchConfig {
        num_beams,
        min_length,
        max_length,
        length_penalty: 0.0,
        early_stopping: true,
        decoder_start_token_id: START,
        eos_token_id: EOS,
    }
}

fn probs(eos: f32, a: f32, b: f32) -> Vec<f32> {
    let ln = |p: f32| if p > 0.0 { p.ln() } else { f32::NEG_INFINITY };
    vec![ln(eos), ln(a), ln(b), f32::NEG_INFINITY]
}

/// Greedy decoding falls into A, A, EOS (p = 0.2) while B, EOS has p = 0.36.
struct GreedyTrap { calls: usize }

impl StepScorer for GreedyTrap {
    fn next_log_probs(&mut self, prefix: &[u32]) -> anyhow::Result<Vec<f32>> {
        self.calls += 1;
        assert_eq!(prefix[0], START);
        Ok(match &prefix[1..] {
            [] => probs(0.0, 0.6, 0.4),
            [A] => probs(0.33, 0.34, 0.33),
            [B] => probs(0.9, 0.05, 0.05),
            _ => probs(0.98, 0.01, 0.01),
        })
    }
}

struct Fixed(Vec<f32>);

impl StepScorer for Fixed {
    fn next_log_probs(&mut self, _prefix: &[u32]) -> anyhow::Result<Vec<f32>> { Ok(self.0.clone()) }
}

#[test]
fn single_beam_is_greedy() {
    let out = beam_search(&mut GreedyTrap { calls: 0 }, &config(1, 0, 10)).expect("search");
    assert_eq!(out, vec![A, A, EOS]);
}

#[test]
fn wider_beam_finds_more_probable_sequence() {
    let mut scorer = GreedyTrap { calls: 0 };
    let out = beam_search(&mut scorer, &config(4, 0, 10)).expect("search");
    assert_eq!(out, vec![B, EOS]);
    assert!(scorer.calls <= 7, "early stopping once four hypotheses finish (calls={})", scorer.calls);
}

#[test]
fn eos_is_masked_until_min_length() {
    // start token + two generated tokens reach min_length 3, so EOS may come third
    let out = beam_search(&mut Fixed(probs(0.9, 0.05, 0.05)), &config(2, 3, 10)).expect("search");
    assert_eq!(out.len(), 3);
    assert_eq!(out.last(), Some(&EOS));
    assert!(!out[..2].contains(&EOS));
}

#[test]
fn min_length_one_allows_immediate_eos() {
    let out = beam_search(&mut Fixed(probs(0.9, 0.05, 0.05)), &config(1, 1, 10)).expect("search");
    assert_eq!(out, vec![EOS]);
}

#[test]
fn open_beams_are_finalised_at_max_length() {
    // max_length 5 covers the start token plus four generated tokens
    let out = beam_search(&mut Fixed(probs(0.0, 0.6, 0.4)), &config(2, 0, 5)).expect("search");
    assert_eq!(out, vec![A; 4]);
}

#[test]
fn scorer_errors_propagate() {
    struct Failing;
    impl StepScorer for Failing {
        fn next_log_probs(&mut self, _prefix: &[u32]) -> anyhow::Result<Vec<f32>> { Err(anyhow::anyhow!("device lost")) }
    }
    let err = beam_search(&mut Failing, &config(4, 0, 10)).unwrap_err();
    assert!(err.to_string().contains("device lost"));
}

#[test]
fn config_from_generation_settings() {
    let cfg = BeamSearchConfig::from_settings(&GenerationSettings::default(), 0, 1);
    assert_eq!(cfg.num_beams, 4);
    assert_eq!(cfg.min_length, 30);
    assert_eq!(cfg.max_length, 100);
    assert!((cfg.length_penalty - 2.0).abs() < f32::EPSILON);
    assert!(cfg.early_stopping);
}
