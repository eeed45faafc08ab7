//! Interactive judging loop.

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use verdict_core::PenaltyKind;
use verdict_source::{GameSession, SessionError};

use crate::display;

const MAX_YEARS: u32 = 25;
const MAX_MONTHS: u32 = 11;

/// Line-based prompts on stdin. `None` means the player quit.
struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn ask(&mut self, question: &str) -> anyhow::Result<Option<String>> {
        let mut out = tokio::io::stdout();
        out.write_all(format!("{question} ").as_bytes()).await?;
        out.flush().await?;
        let line = self.lines.next_line().await.context("reading stdin")?;
        Ok(line
            .map(|l| l.trim().to_string())
            .filter(|l| !is_quit(l)))
    }
}

/// Judge cases for `region` until the player quits or input ends.
pub async fn run(session: &mut GameSession, region: &str) -> anyhow::Result<()> {
    let mut prompt = Prompt::stdin();
    let mut region = region.to_string();
    println!("Type q at any prompt to stop.\n");

    loop {
        let case = match session.load_case(&region).await {
            Ok(case) => case,
            Err(SessionError::Sample(e)) => {
                println!("{e}");
                let Some(answer) = prompt.ask("Region to try, blank to retry:").await? else {
                    break;
                };
                region = next_region(&answer, &region);
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        display::print_dossier(case);

        let options = session.charge_options();
        for (i, name) in options.iter().enumerate() {
            println!("  {}. {name}", i + 1);
        }
        let Some(answer) = prompt.ask("Charge (number or name):").await? else {
            break;
        };
        let charge = parse_choice(&answer, options.len())
            .map(|i| options[i].clone())
            .unwrap_or(answer);

        for (i, kind) in PenaltyKind::ALL.iter().enumerate() {
            println!("  {}. {kind}", i + 1);
        }
        let Some(answer) = prompt.ask("Main penalty [1]:").await? else {
            break;
        };
        let kind = parse_choice(&answer, PenaltyKind::ALL.len())
            .map(|i| PenaltyKind::ALL[i])
            .or_else(|| PenaltyKind::from_label(&answer))
            .unwrap_or(PenaltyKind::FixedTerm);

        let (mut years, mut months) = (0, 0);
        if kind.has_term() {
            let Some(answer) = prompt.ask("Years [0]:").await? else {
                break;
            };
            years = parse_amount(&answer).unwrap_or(0).min(u64::from(MAX_YEARS)) as u32;
            let Some(answer) = prompt.ask("Months [0]:").await? else {
                break;
            };
            months = parse_amount(&answer).unwrap_or(0).min(u64::from(MAX_MONTHS)) as u32;
        }

        let Some(answer) = prompt.ask("Fine in yuan, 0 for none [0]:").await? else {
            break;
        };
        let fine = parse_amount(&answer).unwrap_or(0);

        let judgment = session.judgment_mut();
        judgment.charge = charge;
        judgment.main_penalty = kind;
        judgment.years = years;
        judgment.months = months;
        judgment.has_fine = fine > 0;
        judgment.fine_amount = fine;

        let verdict = session.submit()?;
        if let Some(case) = session.current_case() {
            display::print_verdict(case, &verdict, session.ranks());
        }

        match prompt.ask("Next case? [Y/n]").await? {
            Some(a) if !a.eq_ignore_ascii_case("n") => continue,
            _ => break,
        }
    }

    println!();
    display::print_status(&session.standing(), session.total_score(), &session.statistics());
    Ok(())
}

fn is_quit(input: &str) -> bool {
    input.eq_ignore_ascii_case("q") || input.eq_ignore_ascii_case("quit")
}

/// Region to sample after a failed draw; blank keeps the current one.
fn next_region(answer: &str, current: &str) -> String {
    if answer.is_empty() {
        current.to_string()
    } else {
        answer.to_string()
    }
}

/// 1-based menu choice to a 0-based index.
fn parse_choice(input: &str, len: usize) -> Option<usize> {
    let n: usize = input.parse().ok()?;
    (1..=len).contains(&n).then(|| n - 1)
}

/// Non-negative whole number; blank means absent.
fn parse_amount(input: &str) -> Option<u64> {
    input.replace([',', '，'], "").parse().ok()
}
