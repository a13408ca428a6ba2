use crate::word::Word;

/// How output and error redirections combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IoMode {
    /// `>` and `2>`; both naming the same path fans the two streams into one file.
    #[default]
    Overwrite,
    OutAppend, // >>
    ErrAppend, // 2>>
    BothAppend,
}

impl IoMode {
    pub fn from_flags(out_append: bool, err_append: bool) -> Self {
        match (out_append, err_append) {
            (false, false) => IoMode::Overwrite,
            (true, false) => IoMode::OutAppend,
            (false, true) => IoMode::ErrAppend,
            (true, true) => IoMode::BothAppend,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleCommand {
    pub verb: Word,
    pub params: Vec<Word>,
    pub input: Option<Word>,
    pub output: Option<Word>,
    pub error: Option<Word>,
    pub io: IoMode,
}

impl SimpleCommand {
    pub fn new(verb: impl Into<Word>) -> Self {
        Self {
            verb: verb.into(),
            params: Vec::new(),
            input: None,
            output: None,
            error: None,
            io: IoMode::Overwrite,
        }
    }

    pub fn arg(mut self, arg: impl Into<Word>) -> Self {
        self.params.push(arg.into());
        self
    }

    pub fn args<I, W>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = W>,
        W: Into<Word>,
    {
        self.params.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin(mut self, path: impl Into<Word>) -> Self {
        self.input = Some(path.into());
        self
    }

    pub fn stdout(mut self, path: impl Into<Word>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn stderr(mut self, path: impl Into<Word>) -> Self {
        self.error = Some(path.into());
        self
    }

    pub fn io(mut self, io: IoMode) -> Self {
        self.io = io;
        self
    }

    /// Verb followed by the parameters, as handed to `execvp`.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(&self.verb)
            .chain(&self.params)
            .map(Word::value)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandNode {
    Simple(SimpleCommand),
    Sequential {
        left: Box<CommandNode>,
        right: Box<CommandNode>,
    },
    Parallel {
        left: Box<CommandNode>,
        right: Box<CommandNode>,
    },
    Pipe {
        left: Box<CommandNode>,
        right: Box<CommandNode>,
    },
    IfFailed {
        left: Box<CommandNode>,
        right: Box<CommandNode>,
    },
    IfSucceeded {
        left: Box<CommandNode>,
        right: Box<CommandNode>,
    },
    Dummy,
}

impl CommandNode {
    pub fn sequential(left: CommandNode, right: CommandNode) -> Self {
        CommandNode::Sequential { left: Box::new(left), right: Box::new(right) }
    }

    pub fn parallel(left: CommandNode, right: CommandNode) -> Self {
        CommandNode::Parallel { left: Box::new(left), right: Box::new(right) }
    }

    pub fn pipe(left: CommandNode, right: CommandNode) -> Self {
        CommandNode::Pipe { left: Box::new(left), right: Box::new(right) }
    }

    pub fn if_failed(left: CommandNode, right: CommandNode) -> Self {
        CommandNode::IfFailed { left: Box::new(left), right: Box::new(right) }
    }

    pub fn if_succeeded(left: CommandNode, right: CommandNode) -> Self {
        CommandNode::IfSucceeded { left: Box::new(left), right: Box::new(right) }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CommandNode::Simple(_) => "simple",
            CommandNode::Sequential { .. } => "sequential",
            CommandNode::Parallel { .. } => "parallel",
            CommandNode::Pipe { .. } => "pipe",
            CommandNode::IfFailed { .. } => "if-failed",
            CommandNode::IfSucceeded { .. } => "if-succeeded",
            CommandNode::Dummy => "dummy",
        }
    }
}

impl From<SimpleCommand> for CommandNode {
    fn from(cmd: SimpleCommand) -> Self {
        CommandNode::Simple(cmd)
    }
}
