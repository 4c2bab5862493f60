#![allow(dead_code)] // Each integration test crate uses a different subset of the helpers

use blockdag_consensus::{consensus::test_consensus::TestConsensus, model::block_node::BlockNode};
use blockdag_consensus_core::{
    BlockHashMap, HashMapCustomHasher,
    config::{Config, ConfigBuilder, params::SIMNET_PARAMS},
};
use blockdag_hashes::Hash;
use serde::Deserialize;
use std::{
    fs::{self, File, ReadDir},
    io::{self, BufReader},
    path::Path,
    sync::Arc,
};

pub fn open_file(file_path: &str) -> File {
    match File::open(file_path) {
        Ok(file) => file,
        Err(e) => match e.kind() {
            io::ErrorKind::NotFound => {
                // When run from the workspace root the working directory is one level up
                File::open(Path::new("consensus").join(file_path)).unwrap()
            }
            _ => panic!("{}", e),
        },
    }
}

pub fn read_dir(dir_path: &str) -> ReadDir {
    match fs::read_dir(dir_path) {
        Ok(dir) => dir,
        Err(e) => match e.kind() {
            io::ErrorKind::NotFound => fs::read_dir(Path::new("consensus").join(dir_path)).unwrap(),
            _ => panic!("{}", e),
        },
    }
}

/// A simnet config with the given k, where block `1` is genesis
pub fn config_with_k(k: u8) -> Config {
    ConfigBuilder::new(SIMNET_PARAMS)
        .edit_consensus_params(|p| {
            p.ghostdag_k = k;
            p.genesis.hash = 1.into();
        })
        .build()
}

/// Builds DAGs over letter-named blocks, where `A` is genesis and each letter maps to its
/// 1-based position in the alphabet unless overridden
pub struct LetterDag {
    pub consensus: TestConsensus,
    names: BlockHashMap<char>,
    hashes: Vec<(char, Hash)>,
}

impl LetterDag {
    pub fn new(k: u8) -> Self {
        Self::with_hashes(k, &[])
    }

    pub fn with_hashes(k: u8, overrides: &[(char, u64)]) -> Self {
        let consensus = TestConsensus::new(&config_with_k(k)).unwrap();
        let hashes: Vec<(char, Hash)> = ('A'..='Z')
            .enumerate()
            .map(|(i, c)| {
                let word = overrides.iter().find(|(name, _)| *name == c).map(|(_, word)| *word).unwrap_or(i as u64 + 1);
                (c, Hash::from(word))
            })
            .collect();
        let names = hashes.iter().map(|(c, h)| (*h, *c)).collect();
        Self { consensus, names, hashes }
    }

    pub fn hash(&self, name: char) -> Hash {
        self.hashes.iter().find(|(c, _)| *c == name).unwrap().1
    }

    pub fn name(&self, hash: Hash) -> char {
        self.names[&hash]
    }

    pub fn names(&self, hashes: &[Hash]) -> String {
        hashes.iter().map(|h| self.name(*h)).collect()
    }

    pub fn add(&self, name: char, parents: &str) -> Arc<BlockNode> {
        let parents = parents.chars().map(|c| self.hash(c)).collect();
        self.consensus.add_block_with_parents(self.hash(name), parents).unwrap().node
    }

    pub fn node(&self, name: char) -> Arc<BlockNode> {
        self.consensus.lookup(self.hash(name)).unwrap()
    }
}

#[derive(Deserialize, Debug)]
pub struct JsonDag {
    pub k: u8,
    pub blocks: Vec<JsonBlock>,
}

#[derive(Deserialize, Debug)]
pub struct JsonBlock {
    pub id: String,
    pub parents: Vec<String>,
    pub expected: Option<JsonExpected>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct JsonExpected {
    pub selected_parent: String,
    pub blue_score: u64,
    pub mergeset_blues: Vec<String>,
    pub mergeset_reds: Vec<String>,
}

/// Maps a fixture id to a hash. Ids are offset by one to avoid the zero hash
pub fn fixture_hash(id: &str) -> Hash {
    (id.parse::<u64>().unwrap() + 1).into()
}

pub fn read_json_dag(path: &Path) -> JsonDag {
    let file = open_file(path.to_str().unwrap());
    serde_json::from_reader(BufReader::new(file)).unwrap()
}
