use std::path::Path;

use anyhow::Context;
use asic_merge_core::container::ContainerResult;
use asic_merge_core::{Container, DigestAlgorithm, SignatureVerifier};
use serde_json::json;
use tracing::error;

use crate::cli::args::InspectArgs;
use crate::exit_codes;

struct DataFileLine {
    name: String,
    media_type: String,
    digest: String,
}

struct SignatureLine {
    file_name: String,
    fingerprint: String,
}

struct Listing {
    data_files: Vec<DataFileLine>,
    signatures: Vec<SignatureLine>,
}

pub fn run(args: InspectArgs) -> anyhow::Result<i32> {
    let verifier = args.verify.verifier();
    let listing = match inspect(&args.container, args.digest, verifier.as_ref()) {
        Ok(listing) => listing,
        Err(e) => {
            error!(container = %args.container.display(), error = %e, "inspection failed");
            return Ok(exit_codes::MERGE_FAILED);
        }
    };

    if args.json {
        let value = json!({
            "path": args.container,
            "verifier": verifier.name(),
            "data_files": listing.data_files.iter().map(|f| json!({
                "name": f.name,
                "media_type": f.media_type,
                "digest": f.digest,
            })).collect::<Vec<_>>(),
            "signatures": listing.signatures.iter().map(|s| json!({
                "file_name": s.file_name,
                "fingerprint": s.fingerprint,
            })).collect::<Vec<_>>(),
        });
        let out = serde_json::to_string_pretty(&value).context("failed to serialize listing")?;
        println!("{out}");
    } else {
        println!("{} (verified: {})", args.container.display(), verifier.name());
        println!("Data files:");
        for file in &listing.data_files {
            println!("  {}  {}  {}", file.name, file.media_type, file.digest);
        }
        println!("Signatures:");
        for signature in &listing.signatures {
            println!("  {}  {}", signature.file_name, signature.fingerprint);
        }
    }
    Ok(exit_codes::SUCCESS)
}

fn inspect(
    path: &Path,
    algorithm: DigestAlgorithm,
    verifier: &dyn SignatureVerifier,
) -> ContainerResult<Listing> {
    let mut container = Container::open(path)?;
    container.verify(verifier)?;

    let data_files = container
        .iter_data_files()
        .map(|file| {
            file.map(|f| DataFileLine {
                digest: format!("{algorithm}:{}", algorithm.digest(&f.bytes).to_hex()),
                name: f.name,
                media_type: f.media_type,
            })
        })
        .collect::<ContainerResult<Vec<_>>>()?;

    let signatures = container
        .iter_signatures()
        .map(|signature| {
            signature.map(|s| SignatureLine {
                file_name: s.file_name().to_string(),
                fingerprint: s.fingerprint(),
            })
        })
        .collect::<ContainerResult<Vec<_>>>()?;

    Ok(Listing {
        data_files,
        signatures,
    })
}
