use crate::apply::{self, Mode};
use crate::chain::RuleChain;
use crate::mapping::{Generator, Mapping};
use crate::persist;
use crate::rule::Rule;
use crate::template::{Clock, DateFormats, SystemClock};
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// Holds the rule chain, the file list and the options for a rename run.
///
/// The stored mapping list is only refreshed by [`Renamer::generate_mappings`] or
/// [`Renamer::apply_batch`]; editing files or rules leaves it stale.
pub struct Renamer {
    chain: RuleChain,
    files: Vec<PathBuf>,
    dry_run: bool,
    process_extension: bool,
    mappings: Vec<Mapping>,
    formats: DateFormats,
    clock: Box<dyn Clock>,
}

impl Default for Renamer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renamer {
    pub fn new() -> Self {
        Self {
            chain: RuleChain::new(),
            files: Vec::new(),
            dry_run: false,
            process_extension: false,
            mappings: Vec::new(),
            formats: DateFormats::default(),
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn set_process_extension(&mut self, process: bool) {
        self.process_extension = process;
    }

    pub fn set_date_formats(&mut self, formats: DateFormats) {
        self.formats = formats;
    }

    pub fn add_files<I, P>(&mut self, files: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.files.extend(files.into_iter().map(Into::into));
    }

    /// Removes the first occurrence of `file`.
    pub fn remove_file(&mut self, file: &Path) -> bool {
        match self.files.iter().position(|f| f == file) {
            Some(index) => {
                self.files.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear_files(&mut self) {
        self.files.clear();
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn add_rule(&mut self, rule: Rule) -> String {
        self.chain.add(rule)
    }

    pub fn remove_rule_by_id(&mut self, id: &str) -> bool {
        self.chain.remove_by_id(id)
    }

    pub fn remove_rule_by_name(&mut self, name: &str) -> usize {
        self.chain.remove_by_name(name)
    }

    pub fn rule_by_id(&self, id: &str) -> Option<&Rule> {
        self.chain.get(id)
    }

    pub fn replace_rule(&mut self, id: &str, rule: Rule) -> bool {
        self.chain.replace(id, rule)
    }

    pub fn rules(&self) -> Vec<Rule> {
        self.chain.rules()
    }

    pub fn chain(&self) -> &RuleChain {
        &self.chain
    }

    pub fn save_rules(&self) -> persist::Result<String> {
        persist::rules_to_json(&self.chain.rules())
    }

    /// Replaces the current rules with the ones in `data`.
    pub fn load_rules(&mut self, data: &str) -> persist::Result<()> {
        let rules = persist::rules_from_json(data)?;
        info!("Loaded {} rule(s)", rules.len());
        self.chain.reset(rules);
        Ok(())
    }

    /// Mappings from the last generation, possibly stale.
    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    /// Regenerates one mapping per file, in file order, without applying them.
    pub fn generate_mappings(&mut self) -> &[Mapping] {
        let mut generator = Generator::new(
            &self.chain,
            self.process_extension,
            self.clock.as_ref(),
            &self.formats,
        );
        self.mappings = generator.generate_all(&self.files);
        info!(
            "Generated {} mapping(s) from {} rule(s)",
            self.mappings.len(),
            self.chain.len()
        );
        &self.mappings
    }

    /// Generates mappings for the current files and applies them in [`Mode::Normal`].
    pub fn apply_batch(&mut self) -> Vec<Mapping> {
        self.apply_batch_with(apply::rename_no_clobber)
    }

    pub fn apply_batch_with<F>(&mut self, rename: F) -> Vec<Mapping>
    where
        F: FnMut(&Path, &Path) -> io::Result<()>,
    {
        self.generate_mappings();
        apply::apply_mapping_with(&self.mappings, Mode::Normal, self.dry_run, rename)
    }

    /// Replays saved mappings, honouring this renamer's dry-run flag.
    pub fn apply_mapping(&self, mappings: &[Mapping], mode: Mode) -> Vec<Mapping> {
        apply::apply_mapping(mappings, mode, self.dry_run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::Status;
    use crate::rule::factory;
    use crate::template::FixedClock;
    use chrono::NaiveDate;

    fn fixed() -> FixedClock {
        FixedClock(
            NaiveDate::from_ymd_opt(2023, 12, 31)
                .unwrap()
                .and_hms_opt(23, 59, 0)
                .unwrap(),
        )
    }

    #[test]
    fn test_file_list_operations() {
        let mut renamer = Renamer::new();
        renamer.add_files(["a.txt", "b.txt", "a.txt"]);
        assert!(renamer.remove_file(Path::new("a.txt")));
        assert_eq!(renamer.files(), &[PathBuf::from("b.txt"), PathBuf::from("a.txt")]);
        assert!(!renamer.remove_file(Path::new("zzz")));
        renamer.clear_files();
        assert!(renamer.files().is_empty());
    }

    #[test]
    fn test_rule_operations() {
        let mut renamer = Renamer::new();
        let id = renamer.add_rule(factory::add_prefix("x_"));
        renamer.add_rule(factory::add_suffix("_y"));

        assert_eq!(renamer.rule_by_id(&id).unwrap().pattern, "^");
        assert!(renamer.replace_rule(&id, factory::add_prefix("z_")));
        assert_eq!(renamer.rule_by_id(&id).unwrap().replace, "z_");
        assert_eq!(renamer.remove_rule_by_name("AddSuffix"), 1);
        assert!(renamer.remove_rule_by_id(&id));
        assert!(renamer.rules().is_empty());
    }

    #[test]
    fn test_mappings_are_stale_until_regenerated() {
        let mut renamer = Renamer::new().with_clock(fixed());
        renamer.add_rule(factory::add_prefix("x_"));
        renamer.add_files(["a.txt"]);
        renamer.generate_mappings();

        renamer.add_files(["b.txt"]);
        assert_eq!(renamer.mappings().len(), 1);
        assert_eq!(renamer.generate_mappings().len(), 2);
    }

    #[test]
    fn test_save_and_load_rules_reproduce_outputs() {
        let mut original = Renamer::new().with_clock(fixed());
        original.add_rule(factory::replace_spaces("-"));
        original.add_rule(factory::add_suffix("_{date}_{index:1:2}"));
        original.add_files(["my notes.md", "todo list.md"]);
        let expected = original.generate_mappings().to_vec();

        let saved = original.save_rules().unwrap();
        let mut restored = Renamer::new().with_clock(fixed());
        restored.load_rules(&saved).unwrap();
        restored.add_files(["my notes.md", "todo list.md"]);

        assert_eq!(restored.rules(), original.rules());
        assert_eq!(restored.generate_mappings(), expected.as_slice());
        assert_eq!(expected[1].new_path, PathBuf::from("todo-list_2023-12-31_02.md"));
    }

    #[test]
    fn test_batch_dry_run_returns_generated_mappings() {
        let mut renamer = Renamer::new();
        renamer.add_rule(factory::add_prefix("x_"));
        renamer.add_files(["a.txt", "b.txt"]);
        renamer.set_dry_run(true);

        let mut calls = 0;
        let results = renamer.apply_batch_with(|_: &Path, _: &Path| {
            calls += 1;
            Ok(())
        });

        assert_eq!(calls, 0);
        assert_eq!(results, renamer.mappings());
        assert!(results.iter().all(|m| m.status == Status::Pending));
        assert_eq!(results[0].new_path, PathBuf::from("x_a.txt"));
    }

    #[test]
    fn test_out_of_range_index_tokens_stay_verbatim() {
        let mut renamer = Renamer::new();
        renamer.add_rule(factory::add_prefix("{index:18446744073709551615}_"));
        renamer.add_rule(factory::add_suffix("_{index:1:70000}"));
        renamer.add_files(["a", "b"]);

        let mappings = renamer.generate_mappings();

        assert_eq!(
            mappings[0].new_path,
            PathBuf::from("18446744073709551615_a_{index:1:70000}")
        );
        assert_eq!(
            mappings[1].new_path,
            PathBuf::from("{index:18446744073709551615:0}_b_{index:1:70000}")
        );
    }

    #[test]
    fn test_each_batch_restarts_the_counter() {
        let mut renamer = Renamer::new();
        renamer.add_rule(factory::add_prefix("{index}_"));
        renamer.add_files(["a"]);
        renamer.set_dry_run(true);

        assert_eq!(renamer.apply_batch()[0].new_path, PathBuf::from("1_a"));
        assert_eq!(renamer.apply_batch()[0].new_path, PathBuf::from("1_a"));
    }
}
