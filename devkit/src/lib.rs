/*!
# NetMon DevKit - Stubs et Utilitaires pour Développement

Bibliothèque facilitant les tests du relais NetMon avec:
- Construction de snapshots conformes au format network_data.json
- Faux scanner (script sh) au code de sortie et aux sorties choisis
- Harness de test avec dossier temporaire et fichier snapshot
*/

pub mod snapshot_builder;
pub mod scanner_stub;
pub mod test_utils;

pub use snapshot_builder::SnapshotBuilder;
pub use scanner_stub::ScannerStub;
pub use test_utils::TestHarness;
