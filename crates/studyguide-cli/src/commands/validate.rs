//! The `studyguide validate` command.

use std::path::PathBuf;

use anyhow::Result;

use studyguide_core::model::IndexBase;
use studyguide_core::normalize::{load_bank_directory, load_bank_file, LoadedBank, NormalizeOptions};

pub fn execute(bank_path: PathBuf, one_based: bool) -> Result<()> {
    let options = NormalizeOptions {
        index_base: if one_based {
            IndexBase::One
        } else {
            IndexBase::Zero
        },
    };

    let banks = if bank_path.is_dir() {
        load_bank_directory(&bank_path, &options)?
    } else {
        vec![LoadedBank {
            bank: load_bank_file(&bank_path, &options)?,
            path: bank_path.clone(),
        }]
    };
    anyhow::ensure!(
        !banks.is_empty(),
        "no usable banks found in {}",
        bank_path.display()
    );

    let mut total_warnings = 0;

    for loaded in &banks {
        let bank = &loaded.bank;
        println!(
            "Bank: {} ({} questions, {} dropped)",
            loaded.path.display(),
            bank.questions.len(),
            bank.dropped()
        );

        for w in &bank.warnings {
            let prefix = match &w.id {
                Some(id) => format!("  [#{} {id}]", w.index),
                None => format!("  [#{}]", w.index),
            };
            let kind = if w.dropped { "DROPPED" } else { "WARNING" };
            println!("{prefix} {kind}: {}", w.message);
        }
        total_warnings += bank.warnings.len();
    }

    if total_warnings == 0 {
        println!("All banks valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
