//! Small standalone helpers: zone lookup, EUNIS level-3 codes, new-map ids.

use std::path::PathBuf;

use combmap_recon::classify::HabitatClassifier;
use combmap_recon::eunis::to_level3;
use combmap_recon::pairing::new_map_ids;

use crate::CliError;

pub fn cmd_classify(codes: Vec<String>) -> Result<(), CliError> {
    let classifier = HabitatClassifier::default();
    let cleaned = classifier.clean(codes.iter().map(String::as_str));
    let zone = classifier.classify(cleaned.iter().map(String::as_str));
    println!("{zone}");
    Ok(())
}

pub fn cmd_level3(values: Vec<String>) -> Result<(), CliError> {
    for value in &values {
        println!("{}", to_level3(value));
    }
    Ok(())
}

pub fn cmd_new_maps(reference: PathBuf, combined: PathBuf) -> Result<(), CliError> {
    let read = |path: &PathBuf| {
        combmap_io::read_id_list(path)
            .map_err(|e| CliError::args(e.to_string()).with_hint("expected a text file with one id per line"))
    };
    let reference_ids = read(&reference)?;
    let combined_ids = read(&combined)?;

    let new_ids = new_map_ids(
        reference_ids.iter().map(String::as_str),
        combined_ids.iter().map(String::as_str),
    );
    for id in &new_ids {
        println!("{id}");
    }
    eprintln!("{} of {} reference ids are not in the combined map", new_ids.len(), reference_ids.len());
    Ok(())
}
