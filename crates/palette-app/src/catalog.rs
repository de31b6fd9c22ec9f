// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Page, matches_query};

pub const DEFAULT_TASKS: [&str; 8] = [
    "Qual é o ID da tarefa que pertence à loja 40 e à categoria zaffari?",
    "Lista-me tudo.",
    " Qual é o utilizador ao qual a tarefa com o ID c6e23d19-0185-44bd-9127-02301871eb7b está atribuído?",
    "Quantas tarefas pertencem à loja 50 e à categoria zaffari?",
    "Quantas tarefas pertencem à loja 40 ?",
    " Quais são os IDs das tarefas que pertencem à loja 33 e à categoria zaffari?",
    "Quantas tarefas existem no total?",
    "A tarefa com o ID b97fd9e7-0e53-4553-8186-11869262901c está atribuída a algum utilizador?",
];

pub fn default_tasks() -> Vec<String> {
    DEFAULT_TASKS.iter().map(|task| (*task).to_owned()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandGroup {
    Tasks,
    Resources,
    Help,
}

impl CommandGroup {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Tasks => "Tasks",
            Self::Resources => "Resources",
            Self::Help => "Help",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HomeCommand {
    pub group: CommandGroup,
    pub label: &'static str,
    pub shortcut: &'static str,
    pub target: Page,
}

pub const HOME_COMMANDS: [HomeCommand; 5] = [
    HomeCommand {
        group: CommandGroup::Tasks,
        label: "Search Tasks...",
        shortcut: "^ T",
        target: Page::Tasks,
    },
    HomeCommand {
        group: CommandGroup::Tasks,
        label: "See Tasks Metrics",
        shortcut: "",
        target: Page::TaskMetrics,
    },
    HomeCommand {
        group: CommandGroup::Resources,
        label: "Search Resources...",
        shortcut: "^ R",
        target: Page::SearchResources,
    },
    HomeCommand {
        group: CommandGroup::Resources,
        label: "See Resources Metrics",
        shortcut: "",
        target: Page::ResourceMetrics,
    },
    HomeCommand {
        group: CommandGroup::Help,
        label: "Ask to find...",
        shortcut: "^ A",
        target: Page::Help,
    },
];

pub fn filter_home_commands(query: &str) -> Vec<HomeCommand> {
    HOME_COMMANDS
        .iter()
        .copied()
        .filter(|command| matches_query(command.label, query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{CommandGroup, DEFAULT_TASKS, HOME_COMMANDS, default_tasks, filter_home_commands};
    use crate::Page;

    #[test]
    fn default_task_list_has_eight_items() {
        assert_eq!(DEFAULT_TASKS.len(), 8);
        assert_eq!(default_tasks()[6], "Quantas tarefas existem no total?");
    }

    #[test]
    fn home_commands_cover_every_non_detail_page() {
        let targets: Vec<Page> = HOME_COMMANDS.iter().map(|command| command.target).collect();
        assert_eq!(
            targets,
            vec![
                Page::Tasks,
                Page::TaskMetrics,
                Page::SearchResources,
                Page::ResourceMetrics,
                Page::Help,
            ]
        );
    }

    #[test]
    fn home_commands_filter_by_label() {
        let matches = filter_home_commands("metrics");
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|command| command.label.contains("Metrics")));

        let ask = filter_home_commands("ASK");
        let labels: Vec<&str> = ask.iter().map(|command| command.label).collect();
        assert_eq!(
            labels,
            vec!["Search Tasks...", "See Tasks Metrics", "Ask to find..."]
        );

        let help = filter_home_commands("find");
        assert_eq!(help.len(), 1);
        assert_eq!(help[0].group, CommandGroup::Help);

        assert!(filter_home_commands("zzz").is_empty());
    }
}
